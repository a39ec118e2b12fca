//! Cancellation utilities
//!
//! First-class cancellation for text streams. Cancelling stops fragment
//! consumption; the wrapped stream is dropped, which closes the underlying
//! HTTP connection so the provider stops generating tokens.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::stream::TextStream;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Make a text stream cancellable and return its cancel handle.
pub fn make_cancellable(stream: TextStream) -> (TextStream, CancelHandle) {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = CancelHandle::new(flag.clone());
    let mut inner = stream;
    let s = async_stream::stream! {
        use futures::StreamExt;
        loop {
            if flag.load(Ordering::SeqCst) {
                break;
            }
            match inner.next().await {
                Some(item) => {
                    if flag.load(Ordering::SeqCst) {
                        break;
                    }
                    yield item;
                }
                None => break,
            }
        }
        tracing::debug!(cancelled = flag.load(Ordering::SeqCst), "text stream finished");
        drop(inner);
    };
    (Box::pin(s), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::stream::TextEvent;
    use futures::StreamExt;

    #[tokio::test]
    async fn cancel_stops_the_stream() {
        let source: TextStream = Box::pin(futures::stream::iter(
            (0..10).map(|i| Ok::<_, LlmError>(TextEvent::Fragment(format!("{i}")))),
        ));
        let (mut stream, handle) = make_cancellable(source);

        assert_eq!(stream.next().await.unwrap().unwrap(), TextEvent::Fragment("0".into()));
        assert_eq!(stream.next().await.unwrap().unwrap(), TextEvent::Fragment("1".into()));
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn uncancelled_stream_runs_to_completion() {
        let source: TextStream = Box::pin(futures::stream::iter(
            vec!["a", "b"]
                .into_iter()
                .map(|s| Ok::<_, LlmError>(TextEvent::Fragment(s.to_string()))),
        ));
        let (stream, _handle) = make_cancellable(source);
        let text = crate::stream::collect_text(stream).await.unwrap();
        assert_eq!(text, "ab");
    }
}
