//! Error Handling Module
//!
//! Two layers of errors flow through the crate:
//! - [`ProviderError`]: the normalized failure of a single provider/model attempt.
//!   Every adapter translates its provider-specific error payloads into this shape.
//! - [`LlmError`]: what callers of the generation core actually see.
//!
//! # Example
//!
//! ```rust,ignore
//! use explain_levels::error::{LlmError, ProviderError};
//!
//! let err = ProviderError::http("gemini", Some("gemini-2.5-flash"), 429, "quota", None);
//! assert!(err.is_rate_limited());
//! let surfaced: LlmError = err.into();
//! assert_eq!(surfaced.message(), "quota");
//! ```

use std::time::Duration;

/// Normalized failure of one provider/model attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.describe())]
pub struct ProviderError {
    /// Provider that produced the error (e.g. "groq", "gemini")
    pub provider_id: String,
    /// Model that was attempted, when the provider has several
    pub model_id: Option<String>,
    /// HTTP status of the rejected call; `None` for transport failures
    pub status: Option<u16>,
    /// Human-readable message extracted from the provider payload
    pub message: String,
    /// Provider-supplied retry hint
    pub retry_after: Option<Duration>,
    kind: ProviderErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderErrorKind {
    Http,
    Transport,
    Timeout,
}

impl ProviderError {
    /// A non-success HTTP response.
    pub fn http(
        provider_id: impl Into<String>,
        model_id: Option<&str>,
        status: u16,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.map(str::to_string),
            status: Some(status),
            message: message.into(),
            retry_after,
            kind: ProviderErrorKind::Http,
        }
    }

    /// Connection failure, broken body read, or similar.
    pub fn transport(
        provider_id: impl Into<String>,
        model_id: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.map(str::to_string),
            status: None,
            message: message.into(),
            retry_after: None,
            kind: ProviderErrorKind::Transport,
        }
    }

    /// The attempt did not finish within its time budget.
    pub fn timeout(provider_id: impl Into<String>, model_id: Option<&str>, after: Duration) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.map(str::to_string),
            status: None,
            message: format!("request timed out after {}ms", after.as_millis()),
            retry_after: None,
            kind: ProviderErrorKind::Timeout,
        }
    }

    /// Map a reqwest failure; timeouts keep their own kind.
    pub fn from_reqwest(provider_id: &str, model_id: Option<&str>, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            let mut e = Self::transport(provider_id, model_id, format!("request timed out: {err}"));
            e.kind = ProviderErrorKind::Timeout;
            return e;
        }
        Self::transport(provider_id, model_id, format!("request failed: {err}"))
    }

    /// HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ProviderErrorKind::Timeout
    }

    /// `{provider} model {model} failed: {status} - {message}`, dropping
    /// the parts that are absent.
    fn describe(&self) -> String {
        let mut out = self.provider_id.clone();
        if let Some(model) = &self.model_id {
            out.push_str(" model ");
            out.push_str(model);
        }
        out.push_str(" failed: ");
        if let Some(status) = self.status {
            out.push_str(&format!("{status} - "));
        }
        out.push_str(&self.message);
        out
    }

    /// Retry hint in whole milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        self.retry_after.map(|d| d.as_millis() as u64)
    }
}

/// Errors surfaced by the generation core and its collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Missing credential or otherwise unusable configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Invalid request input (empty topic, unknown level, bad override).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The most recent provider failure once every candidate was exhausted.
    #[error("{0}")]
    Provider(ProviderError),

    /// Every candidate was exhausted without any recorded error.
    #[error("All LLM providers failed")]
    AllProvidersFailed,

    /// Persistence collaborator failure.
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// The underlying human message without the classification prefix.
    ///
    /// For an exhausted cascade this is the last candidate's provider message.
    pub fn message(&self) -> String {
        match self {
            Self::Provider(e) => e.message.clone(),
            Self::ConfigurationError(m)
            | Self::InvalidInput(m)
            | Self::StorageError(m)
            | Self::JsonError(m)
            | Self::InternalError(m) => m.clone(),
            Self::AllProvidersFailed => "All LLM providers failed".to_string(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Provider(e) => e.status,
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_rate_limited())
    }

    /// The provider error behind this error, if any.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProviderError> for LlmError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for LlmError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_derived_from_status() {
        let limited = ProviderError::http("gemini", Some("m"), 429, "slow down", None);
        let other = ProviderError::http("gemini", Some("m"), 500, "boom", None);
        assert!(limited.is_rate_limited());
        assert!(!other.is_rate_limited());
        assert!(!ProviderError::transport("groq", None, "reset").is_rate_limited());
    }

    #[test]
    fn display_matches_provider_and_model() {
        let err = ProviderError::http("gemini", Some("gemini-2.5-flash"), 503, "overloaded", None);
        assert_eq!(
            err.to_string(),
            "gemini model gemini-2.5-flash failed: 503 - overloaded"
        );
        let err = ProviderError::transport("groq", None, "connection reset");
        assert_eq!(err.to_string(), "groq failed: connection reset");
    }

    #[test]
    fn provider_error_is_a_std_error() {
        fn boxed() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err(ProviderError::http("groq", Some("llama"), 401, "Invalid API Key", None))?;
            Ok(())
        }
        let err = boxed().unwrap_err();
        assert_eq!(err.to_string(), "groq model llama failed: 401 - Invalid API Key");

        let surfaced = LlmError::from(ProviderError::timeout(
            "gemini",
            Some("gemini-2.5-flash"),
            Duration::from_millis(1500),
        ));
        assert_eq!(
            surfaced.to_string(),
            "gemini model gemini-2.5-flash failed: request timed out after 1500ms"
        );
    }

    #[test]
    fn message_unwraps_provider_error() {
        let err: LlmError =
            ProviderError::http("gemini", Some("m"), 429, "Resource exhausted", None).into();
        assert_eq!(err.message(), "Resource exhausted");
        assert_eq!(err.status_code(), Some(429));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::JsonError(_)));
    }

    #[test]
    fn timeout_kind() {
        let err = ProviderError::timeout("groq", None, Duration::from_secs(2));
        assert!(err.is_timeout());
        assert_eq!(err.message, "request timed out after 2000ms");
    }
}
