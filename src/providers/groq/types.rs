//! Groq wire types (OpenAI-compatible chat completions)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GroqMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Request body for `POST {base}/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct GroqChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<GroqMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
}

/// One streamed `chat.completion.chunk`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroqChatStreamChunk {
    #[serde(default)]
    pub choices: Vec<GroqStreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroqStreamChoice {
    #[serde(default)]
    pub delta: GroqDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroqDelta {
    pub content: Option<String>,
}
