//! Topic slugs
//!
//! `"Quantum Computing"` ⇄ `"quantum-computing"`.

/// Convert a topic into a URL-friendly slug.
///
/// Accented Latin letters fold to ASCII and common symbols become words
/// (`&` is `and`). Hyphens count as whitespace, anything else outside ASCII
/// letters and digits is dropped, and whitespace runs become a single `-`.
pub fn create_slug(topic: &str) -> String {
    let mut cleaned = String::with_capacity(topic.len());
    for c in topic.chars() {
        if let Some(word) = symbol_word(c) {
            cleaned.push(' ');
            cleaned.push_str(word);
            cleaned.push(' ');
        } else if let Some(ascii) = fold_latin(c) {
            cleaned.push_str(ascii);
        } else if c == '-' || c.is_whitespace() {
            cleaned.push(' ');
        } else if c.is_ascii_alphanumeric() {
            cleaned.push(c);
        }
    }

    cleaned
        .split_whitespace()
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn symbol_word(c: char) -> Option<&'static str> {
    let word = match c {
        '&' => "and",
        '|' => "or",
        '<' => "less",
        '>' => "greater",
        '$' => "dollar",
        '%' => "percent",
        '€' => "euro",
        '£' => "pound",
        '¥' => "yen",
        '∞' => "infinity",
        '♥' => "love",
        _ => return None,
    };
    Some(word)
}

fn fold_latin(c: char) -> Option<&'static str> {
    let ascii = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'ď' | 'đ' | 'ð' => "d",
        'Ď' | 'Đ' | 'Ð' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'ğ' => "g",
        'Ğ' => "G",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' | 'İ' => "I",
        'ł' | 'ľ' => "l",
        'Ł' | 'Ľ' => "L",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'ř' => "r",
        'Ř' => "R",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'Ś' | 'Š' | 'Ş' | 'Ș' => "S",
        'ß' => "ss",
        'ť' | 'ţ' | 'ț' => "t",
        'Ť' | 'Ţ' | 'Ț' => "T",
        'þ' => "th",
        'Þ' => "TH",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' | 'Ų' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ź' | 'ż' | 'ž' => "z",
        'Ź' | 'Ż' | 'Ž' => "Z",
        _ => return None,
    };
    Some(ascii)
}

/// Turn a slug back into a display title by capitalizing each word.
pub fn slug_to_title(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
