//! Fragment streams
//!
//! Generated text is produced as a stream of fragments. Buffered callers go
//! through [`collect`] (one provider attempt) or [`collect_text`] (the whole
//! cascade); those are the only places fragments are joined.

use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

use crate::error::{LlmError, ProviderError};

/// Fragments produced by one provider attempt.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Events produced by the generation cascade.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<TextEvent, LlmError>> + Send>>;

/// One item of the cascade stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEvent {
    /// Next piece of the answer.
    Fragment(String),
    /// The attempt that produced the preceding fragments failed. Everything
    /// received so far is void; the next candidate starts from scratch.
    Restart,
}

impl TextEvent {
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Self::Fragment(text) => Some(text),
            Self::Restart => None,
        }
    }
}

/// Concatenate fragments in arrival order.
///
/// Stops at the first error; fragments received before it are discarded.
pub async fn collect<S, E>(stream: S) -> Result<String, E>
where
    S: Stream<Item = Result<String, E>>,
{
    futures::pin_mut!(stream);
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

/// Concatenate a cascade stream, honoring [`TextEvent::Restart`].
///
/// Yields exactly what buffered generation returns for the same attempts.
pub async fn collect_text<S>(stream: S) -> Result<String, LlmError>
where
    S: Stream<Item = Result<TextEvent, LlmError>>,
{
    futures::pin_mut!(stream);
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            TextEvent::Fragment(fragment) => text.push_str(&fragment),
            TextEvent::Restart => text.clear(),
        }
    }
    Ok(text)
}
