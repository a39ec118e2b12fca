//! Utility modules
//!
//! Streaming, cancellation and error-payload helpers shared by the
//! provider adapters and the orchestrator.

pub mod cancel;
pub mod error_parsing;
pub mod streaming;

pub use cancel::{CancelHandle, make_cancellable};
pub use error_parsing::{ErrorDetails, extract_error_details, parse_retry_delay};
pub use streaming::{SseFragmentConverter, StreamFactory};
