//! Telemetry and tracing utilities
//!
//! The library only emits `tracing` events; binaries and tests decide where
//! they go. This module offers a ready-made subscriber.
//!
//! ## Example
//!
//! ```rust,ignore
//! use explain_levels::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig {
//!     log_level: tracing::Level::DEBUG,
//!     output_format: OutputFormat::Json,
//!     ..SubscriberConfig::default()
//! };
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::LlmError;

pub const LOG_LEVEL_ENV: &str = "EXPLAIN_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "EXPLAIN_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "EXPLAIN_LOG_FILE";

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per event, fields nested under `fields`
    Json,
    /// One JSON object per event, fields flattened to the top level
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" | "json_compact" => Ok(Self::JsonCompact),
            other => Err(LlmError::ConfigurationError(format!(
                "Invalid log format: {other}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Where and how the subscriber writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Most verbose level emitted for `explain_levels` targets
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// `None` logs to stdout
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    /// Read the `EXPLAIN_LOG_*` keys through `lookup`; unset keys keep
    /// their defaults and a blank log file means stdout.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            config.log_level = parse_level(&level)?;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.output_format = format.parse()?;
        }
        config.log_file = lookup(LOG_FILE_ENV)
            .filter(|f| !f.trim().is_empty())
            .map(PathBuf::from);
        Ok(config)
    }
}

/// `"trace"` through `"error"`, case-insensitive.
pub fn parse_level(level: &str) -> Result<tracing::Level, LlmError> {
    level.trim().parse::<tracing::Level>().map_err(|_| {
        LlmError::ConfigurationError(format!(
            "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
        ))
    })
}

/// Install a global subscriber for this crate's events.
///
/// Returns the file writer's guard when logging to a file; keep it alive
/// for the life of the program or buffered lines are lost. Calling this
/// again after a subscriber is installed is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let filter = format!(
        "explain_levels={}",
        config.log_level.as_str().to_ascii_lowercase()
    );

    let (writer, guard, ansi) = match &config.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                LlmError::ConfigurationError(format!("Invalid log file path: {}", path.display()))
            })?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), None, true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    let init_result = match config.output_format {
        OutputFormat::Text => builder.try_init(),
        OutputFormat::Json => builder.json().with_thread_ids(true).try_init(),
        OutputFormat::JsonCompact => builder.json().flatten_event(true).try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) => {
            let message = e.to_string();
            if message.contains("has already been set") || message.contains("already initialized") {
                tracing::debug!("tracing subscriber already installed");
                Ok(guard)
            } else {
                Err(LlmError::ConfigurationError(format!(
                    "Failed to initialize tracing: {message}"
                )))
            }
        }
    }
}

pub fn init_default() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::default())
}

/// Configure from `EXPLAIN_LOG_LEVEL`, `EXPLAIN_LOG_FORMAT` (text, json,
/// json-compact) and `EXPLAIN_LOG_FILE`.
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::from_lookup(|key| std::env::var(key).ok())?)
}
