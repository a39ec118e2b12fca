//! Provider error payload parsing
//!
//! Turns non-success HTTP responses into [`ProviderError`]s: extracts a
//! human-readable message and, when present, a retry-after hint.

use regex::Regex;
use reqwest::header::HeaderMap;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::ProviderError;

const RETRY_INFO_TYPE: &str = "type.googleapis.com/google.rpc.RetryInfo";

fn retry_delay_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(-?[\d.]+)s").expect("valid retry delay regex"))
}

/// Parse a `<number>s` delay such as `"4s"` or `"4.6s"`.
///
/// Negative values clamp to zero; unparseable or non-finite values yield `None`.
pub fn parse_retry_delay(delay: &str) -> Option<Duration> {
    let captures = retry_delay_pattern().captures(delay)?;
    let seconds: f64 = captures.get(1)?.as_str().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    Some(Duration::from_millis((seconds.max(0.0) * 1000.0).round() as u64))
}

/// Parse a `Retry-After` header value given in (possibly fractional) seconds.
pub fn parse_retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?.trim();
    let seconds: f64 = raw.parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    Some(Duration::from_millis((seconds.max(0.0) * 1000.0).round() as u64))
}

/// Message and retry hint found in an error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    pub message: String,
    pub retry_after: Option<Duration>,
}

/// Extract `error.message` (or `message`, or the raw body) and a Google
/// `RetryInfo.retryDelay` hint from an error body.
pub fn extract_error_details(raw_body: &str) -> ErrorDetails {
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(raw_body) else {
        return ErrorDetails {
            message: raw_body.to_string(),
            retry_after: None,
        };
    };

    let message = parsed
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| parsed.get("message").and_then(|v| v.as_str()))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| raw_body.to_string());

    let retry_after = parsed
        .pointer("/error/details")
        .and_then(|v| v.as_array())
        .and_then(|details| {
            details
                .iter()
                .find(|d| d.get("@type").and_then(|t| t.as_str()) == Some(RETRY_INFO_TYPE))
        })
        .and_then(|d| d.get("retryDelay"))
        .and_then(|v| v.as_str())
        .and_then(parse_retry_delay);

    ErrorDetails {
        message,
        retry_after,
    }
}

/// Read a failed response fully and normalize it.
///
/// The retry hint is taken from the body first, then the `Retry-After`
/// header, then a "try again in 4.6s" phrase in the message.
pub async fn provider_error_from_response(
    provider_id: &str,
    model_id: Option<&str>,
    response: reqwest::Response,
) -> ProviderError {
    let status = response.status().as_u16();
    let header_hint = parse_retry_after_header(response.headers());
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("failed to read error body: {e}"));

    let details = extract_error_details(&body);
    let retry_after = details
        .retry_after
        .or(header_hint)
        .or_else(|| retry_hint_from_message(&details.message));

    tracing::debug!(
        provider = %provider_id,
        model = model_id.unwrap_or("-"),
        status,
        "provider returned error response"
    );
    ProviderError::http(provider_id, model_id, status, details.message, retry_after)
}

fn retry_hint_from_message(message: &str) -> Option<Duration> {
    let lower = message.to_ascii_lowercase();
    let idx = lower.find("try again in")?;
    parse_retry_delay(&message[idx..])
}
