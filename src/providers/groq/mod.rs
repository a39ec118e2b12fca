//! `Groq` provider
//!
//! Primary provider: a single model behind an OpenAI-compatible chat
//! completions endpoint.

mod chat;
pub mod streaming;
pub mod types;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::config::GroqConfig;
use crate::error::ProviderError;

pub use streaming::GroqEventConverter;

pub(crate) const PROVIDER_ID: &str = "groq";

/// Groq adapter
#[derive(Clone)]
pub struct GroqAdapter {
    api_key: SecretString,
    base_url: String,
    http_client: reqwest::Client,
}

impl GroqAdapter {
    pub fn new(config: &GroqConfig, http_client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub(crate) fn build_headers(&self, model: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|e| {
                ProviderError::transport(PROVIDER_ID, Some(model), format!("invalid API key header: {e}"))
            })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl std::fmt::Debug for GroqAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqAdapter")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
