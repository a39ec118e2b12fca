//! Gemini content generation
//!
//! Implements [`ProviderAdapter`] for Gemini.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::providers::ProviderAdapter;
use crate::stream::FragmentStream;
use crate::types::SamplingParams;
use crate::utils::streaming::StreamFactory;

use super::streaming::GeminiEventConverter;
use super::types::GenerateContentRequest;
use super::{GeminiAdapter, PROVIDER_ID};

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<FragmentStream, ProviderError> {
        let headers = self.build_headers(model)?;
        let body = GenerateContentRequest::new(prompt, params);

        tracing::debug!(provider = PROVIDER_ID, model, "opening stream");
        let request = self
            .http_client
            .post(self.stream_url(model))
            .headers(headers)
            .json(&body);
        let response = StreamFactory::send(PROVIDER_ID, Some(model), request).await?;

        Ok(StreamFactory::fragment_stream(
            PROVIDER_ID,
            Some(model),
            response,
            GeminiEventConverter::new(),
        ))
    }
}
