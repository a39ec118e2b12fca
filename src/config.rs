//! Configuration
//!
//! Provider credentials, endpoints, model priority and the rate-limit
//! memory constants. Everything can be built in code or read from the
//! environment with [`GenerationConfig::from_env`].

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::LlmError;

/// Default per-call time budget.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Cooldown applied when a rate-limited model gives no retry hint.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_millis(5000);
/// Extra cooldown on top of every rate-limit backoff.
pub const DEFAULT_RATE_LIMIT_BUFFER: Duration = Duration::from_millis(500);

pub const GROQ_DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Gemini models in priority order: fastest first, higher quota second.
pub const GEMINI_DEFAULT_MODELS: [&str; 2] = ["gemini-2.0-flash-exp", "gemini-2.5-flash"];

/// Cooldown constants for the model availability tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityConfig {
    pub default_backoff: Duration,
    pub safety_buffer: Duration,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            default_backoff: DEFAULT_RETRY_AFTER,
            safety_buffer: DEFAULT_RATE_LIMIT_BUFFER,
        }
    }
}

/// Groq (primary provider) configuration
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: GROQ_DEFAULT_BASE_URL.to_string(),
            model: GROQ_DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Gemini (secondary provider) configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    /// Models in the order they are attempted
    pub models: Vec<String>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: GEMINI_DEFAULT_BASE_URL.to_string(),
            models: GEMINI_DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }
}

/// Top-level configuration for the generation core.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub groq: GroqConfig,
    pub gemini: GeminiConfig,
    /// Time budget for each outbound provider call
    pub request_timeout: Duration,
    pub availability: AvailabilityConfig,
}

impl GenerationConfig {
    pub fn new(groq: GroqConfig, gemini: GeminiConfig) -> Self {
        Self {
            groq,
            gemini,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            availability: AvailabilityConfig::default(),
        }
    }

    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub const fn with_availability(mut self, availability: AvailabilityConfig) -> Self {
        self.availability = availability;
        self
    }

    /// Read configuration from the process environment.
    ///
    /// Required: `GROQ_API_KEY`, `GEMINI_API_KEY`.
    /// Optional: `GROQ_BASE_URL`, `GROQ_MODEL`, `GEMINI_BASE_URL`, `GEMINI_MODELS`
    /// (comma separated), `EXPLAIN_REQUEST_TIMEOUT_SECS`,
    /// `EXPLAIN_RATE_LIMIT_BUFFER_MS`, `EXPLAIN_DEFAULT_RETRY_AFTER_MS`.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let groq_key = get("GROQ_API_KEY").ok_or_else(|| {
            LlmError::ConfigurationError("GROQ_API_KEY is not configured".to_string())
        })?;
        let gemini_key = get("GEMINI_API_KEY").ok_or_else(|| {
            LlmError::ConfigurationError("GEMINI_API_KEY is not configured".to_string())
        })?;

        let mut groq = GroqConfig::new(groq_key);
        if let Some(url) = get("GROQ_BASE_URL") {
            groq = groq.with_base_url(url);
        }
        if let Some(model) = get("GROQ_MODEL") {
            groq = groq.with_model(model);
        }

        let mut gemini = GeminiConfig::new(gemini_key);
        if let Some(url) = get("GEMINI_BASE_URL") {
            gemini = gemini.with_base_url(url);
        }
        if let Some(models) = get("GEMINI_MODELS") {
            let models: Vec<String> = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            if models.is_empty() {
                return Err(LlmError::ConfigurationError(
                    "GEMINI_MODELS must list at least one model".to_string(),
                ));
            }
            gemini = gemini.with_models(models);
        }

        let mut config = Self::new(groq, gemini);
        if let Some(secs) = get("EXPLAIN_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number(
                "EXPLAIN_REQUEST_TIMEOUT_SECS",
                &secs,
            )?);
        }
        if let Some(ms) = get("EXPLAIN_RATE_LIMIT_BUFFER_MS") {
            config.availability.safety_buffer =
                Duration::from_millis(parse_number("EXPLAIN_RATE_LIMIT_BUFFER_MS", &ms)?);
        }
        if let Some(ms) = get("EXPLAIN_DEFAULT_RETRY_AFTER_MS") {
            config.availability.default_backoff =
                Duration::from_millis(parse_number("EXPLAIN_DEFAULT_RETRY_AFTER_MS", &ms)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot serve a request.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.groq.api_key.expose_secret().is_empty() {
            return Err(LlmError::ConfigurationError(
                "GROQ_API_KEY is not configured".to_string(),
            ));
        }
        if self.gemini.api_key.expose_secret().is_empty() {
            return Err(LlmError::ConfigurationError(
                "GEMINI_API_KEY is not configured".to_string(),
            ));
        }
        if self.gemini.models.is_empty() {
            return Err(LlmError::ConfigurationError(
                "at least one Gemini model is required".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(LlmError::ConfigurationError(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, LlmError> {
    value
        .parse::<u64>()
        .map_err(|_| LlmError::ConfigurationError(format!("{key} must be a whole number, got '{value}'")))
}
