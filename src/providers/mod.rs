//! Provider Adapters
//!
//! One adapter per upstream LLM provider. The orchestrator only depends on
//! [`ProviderAdapter`]; concrete adapters own their wire format and error
//! normalization and never retry internally.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::stream::{self, FragmentStream};
use crate::types::SamplingParams;

pub mod gemini;
pub mod groq;

pub use gemini::GeminiAdapter;
pub use groq::GroqAdapter;

/// Capability set of one upstream provider.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable identifier used in logs and errors ("groq", "gemini").
    fn provider_id(&self) -> &str;

    /// Start a streaming generation.
    ///
    /// Resolves once the provider has accepted the call; a non-success
    /// response is returned here as a normalized [`ProviderError`].
    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<FragmentStream, ProviderError>;
}

/// Buffered generation for every [`ProviderAdapter`].
///
/// Collects [`generate_stream`](ProviderAdapter::generate_stream), so both
/// modes of an adapter hit the same endpoint and return the same text.
pub trait ProviderAdapterExt: ProviderAdapter {
    fn generate_complete<'a>(
        &'a self,
        model: &'a str,
        prompt: &'a str,
        params: &'a SamplingParams,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let fragments = self.generate_stream(model, prompt, params).await?;
            stream::collect(fragments).await
        })
    }
}

impl<T: ProviderAdapter + ?Sized> ProviderAdapterExt for T {}

/// One (provider, model) pair the orchestrator may attempt.
#[derive(Clone)]
pub struct ProviderCandidate {
    pub provider_id: String,
    pub model_id: String,
    pub adapter: Arc<dyn ProviderAdapter>,
}

impl ProviderCandidate {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: adapter.provider_id().to_string(),
            model_id: model_id.into(),
            adapter,
        }
    }
}

impl fmt::Debug for ProviderCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCandidate")
            .field("provider_id", &self.provider_id)
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}
