//! Gemini streaming implementation using eventsource-stream
//!
//! `streamGenerateContent?alt=sse` emits one `GenerateContentResponse` per
//! event; the text delta lives at `candidates[0].content.parts[0].text`.

use crate::utils::streaming::SseFragmentConverter;

use super::types::GenerateContentResponse;

/// Gemini event converter
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiEventConverter;

impl GeminiEventConverter {
    pub fn new() -> Self {
        Self
    }
}

impl SseFragmentConverter for GeminiEventConverter {
    fn convert(&self, data: &str) -> Result<Option<String>, serde_json::Error> {
        let response: GenerateContentResponse = serde_json::from_str(data)?;
        Ok(response.first_text().filter(|text| !text.is_empty()))
    }
}
