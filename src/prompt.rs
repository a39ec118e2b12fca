//! Prompt templates
//!
//! Pure mapping from (topic, level) to the text sent to a provider.

use crate::types::ComplexityLevel;

const TOPIC_PLACEHOLDER: &str = "{{topic}}";

/// System instruction for chat-style providers.
pub const SYSTEM_PROMPT: &str = "You are an expert educator that adapts explanations to the requested complexity level. Respond with structured markdown and no additional commentary.";

/// The fixed template for a level, with a `{{topic}}` placeholder.
pub const fn template(level: ComplexityLevel) -> &'static str {
    match level {
        ComplexityLevel::Beginner => {
            "Explain \"{{topic}}\" as if talking to a 5-year-old. Use simple words, fun analogies, and short sentences. Make it exciting and easy to understand. Keep it under 200 words."
        }
        ComplexityLevel::Intermediate => {
            "Explain \"{{topic}}\" at a high school level. Introduce proper terminology but keep it accessible. Use 2-3 paragraphs. Keep it under 300 words."
        }
        ComplexityLevel::Advanced => {
            "Explain \"{{topic}}\" at an undergraduate college level. Include technical details, proper terminology, and some complexity. Assume prior knowledge of basic concepts. Keep it under 400 words."
        }
        ComplexityLevel::Expert => {
            "Explain \"{{topic}}\" at a graduate/PhD level. Include nuanced details, current research context, technical depth, and field-specific terminology. Keep it under 500 words."
        }
    }
}

/// Substitute `topic` into the level's template.
pub fn build_prompt(topic: &str, level: ComplexityLevel) -> String {
    template(level).replacen(TOPIC_PLACEHOLDER, topic, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beginner_prompt_contains_topic_and_ceiling() {
        let prompt = build_prompt("Quantum Computing", ComplexityLevel::Beginner);
        assert!(prompt.contains("\"Quantum Computing\""));
        assert!(prompt.contains("5-year-old"));
        assert!(prompt.contains(&format!(
            "under {} words",
            ComplexityLevel::Beginner.word_limit()
        )));
        assert!(!prompt.contains(TOPIC_PLACEHOLDER));
    }

    #[test]
    fn every_template_has_one_placeholder_and_its_limit() {
        for level in ComplexityLevel::ALL {
            let t = template(level);
            assert_eq!(t.matches(TOPIC_PLACEHOLDER).count(), 1, "{level}");
            assert!(t.contains(&format!("under {} words", level.word_limit())));
        }
    }

    #[test]
    fn topic_with_braces_is_inserted_verbatim() {
        let prompt = build_prompt("{{topic}} loops", ComplexityLevel::Expert);
        assert!(prompt.starts_with("Explain \"{{topic}} loops\" at a graduate/PhD level."));
    }
}
