//! `Groq` Streaming Implementation
//!
//! Turns Groq SSE events into text fragments.

use crate::utils::streaming::SseFragmentConverter;

use super::types::GroqChatStreamChunk;

/// Groq event converter for SSE events
#[derive(Debug, Clone, Copy, Default)]
pub struct GroqEventConverter;

impl GroqEventConverter {
    pub fn new() -> Self {
        Self
    }
}

impl SseFragmentConverter for GroqEventConverter {
    fn convert(&self, data: &str) -> Result<Option<String>, serde_json::Error> {
        let chunk: GroqChatStreamChunk = serde_json::from_str(data)?;
        Ok(chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty()))
    }
}
