//! Common Streaming Utilities
//!
//! Shared plumbing for provider adapters: sending a request with error
//! normalization, and decoding an SSE response body into a
//! [`FragmentStream`] using eventsource-stream (which handles UTF-8
//! boundaries and events split across network reads).

use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::StreamExt;

use crate::error::ProviderError;
use crate::stream::FragmentStream;
use crate::utils::error_parsing::provider_error_from_response;

/// Converts the data payload of one SSE event into an optional fragment.
pub trait SseFragmentConverter: Send + Sync + 'static {
    /// Whether the payload is the provider's end-of-stream sentinel.
    fn is_done(&self, data: &str) -> bool {
        data == "[DONE]"
    }

    /// Extract the text delta. `Ok(None)` means the event carries no text.
    fn convert(&self, data: &str) -> Result<Option<String>, serde_json::Error>;
}

/// Stream factory for provider adapters
pub struct StreamFactory;

impl StreamFactory {
    /// Send a request and normalize transport failures and non-success
    /// statuses into [`ProviderError`]s. The error body is read fully.
    pub async fn send(
        provider_id: &str,
        model_id: Option<&str>,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider_id, model_id, &e))?;

        if !response.status().is_success() {
            return Err(provider_error_from_response(provider_id, model_id, response).await);
        }
        Ok(response)
    }

    /// Decode an SSE response into fragments.
    ///
    /// Empty or unparseable events are skipped; a transport failure while
    /// reading the body ends the stream with an error. The response (and its
    /// connection) is released when the returned stream is dropped.
    pub fn fragment_stream<C>(
        provider_id: &str,
        model_id: Option<&str>,
        response: reqwest::Response,
        converter: C,
    ) -> FragmentStream
    where
        C: SseFragmentConverter,
    {
        let provider = provider_id.to_string();
        let model = model_id.map(str::to_string);
        let s = async_stream::stream! {
            let mut events = Box::pin(response.bytes_stream().eventsource());
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() {
                            continue;
                        }
                        if converter.is_done(data) {
                            break;
                        }
                        match converter.convert(data) {
                            Ok(Some(fragment)) => {
                                if !fragment.is_empty() {
                                    yield Ok(fragment);
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                tracing::trace!(provider = %provider, error = %e, "skipping malformed stream event");
                            }
                        }
                    }
                    Err(EventStreamError::Transport(e)) => {
                        yield Err(ProviderError::from_reqwest(&provider, model.as_deref(), &e));
                        break;
                    }
                    Err(e) => {
                        tracing::trace!(provider = %provider, error = %e, "skipping unparseable SSE frame");
                    }
                }
            }
        };
        Box::pin(s)
    }
}
