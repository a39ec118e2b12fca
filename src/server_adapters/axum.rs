//! Axum-specific server adapters
//!
//! ```rust,ignore
//! use axum::{Json, extract::State, response::Response};
//! use explain_levels::server_adapters::{SseOptions, axum::explain_response};
//!
//! async fn explain(State(service): State<AppService>, Json(body): Json<ExplainBody>) -> Response {
//!     match service.explain(&body.topic, body.levels.as_deref()).await {
//!         Ok(outcome) => explain_response(outcome, SseOptions::development()),
//!         Err(e) => error_response(&e),
//!     }
//! }
//! ```

use std::convert::Infallible;

use axum::Json;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};

use crate::error::LlmError;
use crate::server_adapters::{SseOptions, event_json};
use crate::service::{ExplainOutcome, LevelEventStream};

/// Convert explanation events into an Axum SSE response.
pub fn to_sse_response(
    events: LevelEventStream,
    opts: SseOptions,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let event_stream =
        events.map(move |event| Ok(Event::default().data(event_json(&opts.apply(event)))));
    Sse::new(event_stream)
}

/// JSON for a fully cached topic, SSE otherwise.
pub fn explain_response(outcome: ExplainOutcome, opts: SseOptions) -> Response {
    match outcome {
        ExplainOutcome::Cached(cached) => Json(cached).into_response(),
        ExplainOutcome::Streaming { events, .. } => to_sse_response(events, opts).into_response(),
    }
}

/// Map an error to a status code and `{"error": message}` body.
///
/// Invalid input is a client error; exhaustion and everything else is 500.
pub fn error_response(err: &LlmError) -> Response {
    let status = match err {
        LlmError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}
