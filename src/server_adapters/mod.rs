//! Server adapters: turn explanation streams into HTTP-ready output
//!
//! - **Framework-agnostic**: [`sse_lines`] renders each [`LevelEvent`] as a
//!   `data: {json}\n\n` frame that can be written straight to a response body.
//! - **Axum**: `axum::to_sse_response()` and `axum::explain_response()`
//!   (requires the `server-adapters` feature).
//!
//! ```rust,ignore
//! use explain_levels::server_adapters::{sse_lines, SseOptions};
//! use explain_levels::service::ExplainOutcome;
//!
//! if let ExplainOutcome::Streaming { events, .. } = service.explain("DNA", None).await? {
//!     let body = sse_lines(events, SseOptions::production());
//!     // write each frame to the socket
//! }
//! ```

use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;

use crate::service::{LevelEvent, LevelEventStream};

#[cfg(feature = "server-adapters")]
pub mod axum;

const DEFAULT_MASKED_ERROR: &str = "internal error";

/// Options for SSE encoding.
#[derive(Debug, Clone, Default)]
pub struct SseOptions {
    /// Replace error messages with a generic one.
    ///
    /// Off by default: provider messages such as quota errors are meant to
    /// reach the client.
    pub mask_errors: bool,

    /// Message used when `mask_errors` is set; defaults to "internal error".
    pub masked_error_message: Option<String>,
}

impl SseOptions {
    /// Errors are passed through verbatim.
    pub fn development() -> Self {
        Self::default()
    }

    /// Errors are masked.
    pub fn production() -> Self {
        Self {
            mask_errors: true,
            masked_error_message: None,
        }
    }

    pub(crate) fn apply(&self, event: LevelEvent) -> LevelEvent {
        match event {
            LevelEvent::Error { .. } if self.mask_errors => LevelEvent::error(
                self.masked_error_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MASKED_ERROR.to_string()),
            ),
            other => other,
        }
    }
}

/// JSON payload of one event.
pub fn event_json(event: &LevelEvent) -> String {
    serde_json::to_string(event)
        .unwrap_or_else(|_| format!(r#"{{"error":"{DEFAULT_MASKED_ERROR}"}}"#))
}

/// Render explanation events as SSE frames (`data: {json}\n\n`).
pub fn sse_lines(
    events: LevelEventStream,
    opts: SseOptions,
) -> Pin<Box<dyn Stream<Item = String> + Send>> {
    Box::pin(events.map(move |event| format!("data: {}\n\n", event_json(&opts.apply(event)))))
}
