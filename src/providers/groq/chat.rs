//! `Groq` chat completions
//!
//! Implements [`ProviderAdapter`] for Groq.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};

use crate::error::ProviderError;
use crate::prompt::SYSTEM_PROMPT;
use crate::providers::ProviderAdapter;
use crate::stream::FragmentStream;
use crate::types::SamplingParams;
use crate::utils::streaming::StreamFactory;

use super::streaming::GroqEventConverter;
use super::types::{GroqChatRequest, GroqMessage};
use super::{GroqAdapter, PROVIDER_ID};

impl GroqAdapter {
    fn build_body<'a>(
        model: &'a str,
        prompt: &'a str,
        params: &SamplingParams,
    ) -> GroqChatRequest<'a> {
        GroqChatRequest {
            model,
            messages: vec![
                GroqMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                GroqMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            stream: true,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GroqAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<FragmentStream, ProviderError> {
        let mut headers = self.build_headers(model)?;
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let body = Self::build_body(model, prompt, params);

        tracing::debug!(provider = PROVIDER_ID, model, "opening stream");
        let request = self
            .http_client
            .post(self.chat_url())
            .headers(headers)
            .json(&body);
        let response = StreamFactory::send(PROVIDER_ID, Some(model), request).await?;

        Ok(StreamFactory::fragment_stream(
            PROVIDER_ID,
            Some(model),
            response,
            GroqEventConverter::new(),
        ))
    }
}
