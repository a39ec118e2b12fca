//! Google Gemini provider
//!
//! Secondary provider with several models; each call names the model in
//! the URL path.

mod chat;
pub mod streaming;
pub mod types;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::config::GeminiConfig;
use crate::error::ProviderError;

pub use streaming::GeminiEventConverter;

pub(crate) const PROVIDER_ID: &str = "gemini";

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-goog-api-key");

/// Gemini adapter
#[derive(Clone)]
pub struct GeminiAdapter {
    api_key: SecretString,
    base_url: String,
    http_client: reqwest::Client,
}

impl GeminiAdapter {
    pub fn new(config: &GeminiConfig, http_client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// `{base}/models/{model}:streamGenerateContent?alt=sse`
    pub(crate) fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url,
            urlencoding::encode(model)
        )
    }

    pub(crate) fn build_headers(&self, model: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(self.api_key.expose_secret()).map_err(|e| {
            ProviderError::transport(PROVIDER_ID, Some(model), format!("invalid API key header: {e}"))
        })?;
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl std::fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_name_the_model() {
        let config = GeminiConfig::new("key").with_base_url("http://localhost:9000/v1beta/");
        let adapter = GeminiAdapter::new(&config, reqwest::Client::new());
        assert_eq!(
            adapter.stream_url("gemini-2.5-flash"),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn key_travels_in_header_not_query() {
        let adapter = GeminiAdapter::new(&GeminiConfig::new("abc"), reqwest::Client::new());
        let headers = adapter.build_headers("m").unwrap();
        assert_eq!(headers.get("x-goog-api-key").unwrap(), "abc");
        assert!(!adapter.stream_url("m").contains("abc"));
    }
}
