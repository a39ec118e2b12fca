//! Generation Orchestrator
//!
//! Runs the provider cascade for one request: the primary provider is tried
//! exactly once, then each secondary model in priority order. Secondary
//! models consult the shared [`ModelAvailability`] before every attempt and
//! feed rate-limit failures back into it. Candidates run strictly one after
//! another; only the most recent failure is surfaced on exhaustion.
//!
//! ```rust,ignore
//! use explain_levels::{ComplexityLevel, ExplanationGenerator, GenerationConfig, GenerationRequest, TextEvent};
//! use futures::StreamExt;
//!
//! let generator = ExplanationGenerator::from_config(&GenerationConfig::from_env()?)?;
//! let request = GenerationRequest::new("Quantum Computing", ComplexityLevel::Beginner)?;
//! let mut stream = generator.generate_stream(&request);
//! while let Some(event) = stream.next().await {
//!     match event? {
//!         TextEvent::Fragment(text) => print!("{text}"),
//!         TextEvent::Restart => println!("\n[retrying with another model]"),
//!     }
//! }
//! ```

use futures_util::StreamExt;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::availability::{CandidateModels, ModelAvailability};
use crate::config::{DEFAULT_REQUEST_TIMEOUT, GenerationConfig};
use crate::error::{LlmError, ProviderError};
use crate::prompt::build_prompt;
use crate::providers::{
    GeminiAdapter, GroqAdapter, ProviderAdapter, ProviderAdapterExt, ProviderCandidate,
};
use crate::stream::{TextEvent, TextStream};
use crate::types::GenerationRequest;

/// Multi-provider explanation generator.
///
/// Cheap to clone; clones share adapters and the availability tracker.
#[derive(Clone)]
pub struct ExplanationGenerator {
    primary: ProviderCandidate,
    secondary: Arc<dyn ProviderAdapter>,
    secondary_models: Arc<[String]>,
    availability: Arc<ModelAvailability>,
    request_timeout: Duration,
}

impl ExplanationGenerator {
    /// Assemble a generator from already-constructed adapters.
    ///
    /// `secondary_models` is the secondary provider's priority order.
    pub fn new<I, S>(
        primary: ProviderCandidate,
        secondary: Arc<dyn ProviderAdapter>,
        secondary_models: I,
        availability: Arc<ModelAvailability>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            primary,
            secondary,
            secondary_models: secondary_models
                .into_iter()
                .map(Into::into)
                .collect::<Vec<String>>()
                .into(),
            availability,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Build Groq (primary) and Gemini (secondary) adapters over one shared
    /// HTTP client, with a fresh availability tracker.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
            })?;

        let groq: Arc<dyn ProviderAdapter> =
            Arc::new(GroqAdapter::new(&config.groq, http_client.clone()));
        let gemini: Arc<dyn ProviderAdapter> =
            Arc::new(GeminiAdapter::new(&config.gemini, http_client));

        Ok(Self::new(
            ProviderCandidate::new(groq, config.groq.model.clone()),
            gemini,
            config.gemini.models.clone(),
            Arc::new(ModelAvailability::new(config.availability)),
        )
        .with_request_timeout(config.request_timeout))
    }

    /// Time budget of one attempt, from opening the call to its last fragment.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn availability(&self) -> &Arc<ModelAvailability> {
        &self.availability
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Configured candidate order, ignoring availability.
    pub fn candidates(&self) -> Vec<ProviderCandidate> {
        std::iter::once(self.primary.clone())
            .chain(self.secondary_models.iter().map(|m| self.secondary_candidate(m)))
            .collect()
    }

    fn secondary_candidate(&self, model: &str) -> ProviderCandidate {
        ProviderCandidate {
            provider_id: self.secondary.provider_id().to_string(),
            model_id: model.to_string(),
            adapter: self.secondary.clone(),
        }
    }

    /// Stream the explanation fragment by fragment.
    ///
    /// Fragments of the active attempt are forwarded as they arrive. If an
    /// attempt fails after forwarding output, a [`TextEvent::Restart`] voids
    /// those fragments before the cascade moves on; [`collect_text`] over
    /// this stream always equals [`generate_complete`](Self::generate_complete).
    /// On exhaustion the stream yields one final error. Dropping the stream
    /// cancels the in-flight call.
    ///
    /// [`collect_text`]: crate::stream::collect_text
    pub fn generate_stream(&self, request: &GenerationRequest) -> TextStream {
        let generator = self.clone();
        let prompt = build_prompt(request.topic(), request.level());
        let params = request.sampling();
        let level = request.level();

        let s = async_stream::stream! {
            let mut last_error: Option<ProviderError> = None;

            for attempt in Cascade::new(&generator) {
                let candidate = &attempt.candidate;
                attempt.log_start(level.as_str());
                let deadline = Instant::now() + generator.request_timeout;

                let opened = tokio::time::timeout_at(
                    deadline,
                    candidate.adapter.generate_stream(&candidate.model_id, &prompt, &params),
                )
                .await;
                let mut fragments = match opened {
                    Ok(Ok(fragments)) => fragments,
                    Ok(Err(e)) => {
                        generator.record_failure(&attempt, &e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(_) => {
                        let e = generator.timeout_error(candidate);
                        generator.record_failure(&attempt, &e);
                        last_error = Some(e);
                        continue;
                    }
                };

                let mut forwarded = 0usize;
                let mut failure = None;
                loop {
                    match tokio::time::timeout_at(deadline, fragments.next()).await {
                        Ok(Some(Ok(fragment))) => {
                            forwarded += 1;
                            yield Ok(TextEvent::Fragment(fragment));
                        }
                        Ok(Some(Err(e))) => {
                            failure = Some(e);
                            break;
                        }
                        Ok(None) => break,
                        Err(_) => {
                            failure = Some(generator.timeout_error(candidate));
                            break;
                        }
                    }
                }
                drop(fragments);

                match failure {
                    None => {
                        attempt.log_success(forwarded);
                        return;
                    }
                    Some(e) => {
                        generator.record_failure(&attempt, &e);
                        last_error = Some(e);
                        if forwarded > 0 {
                            tracing::warn!(
                                provider = %candidate.provider_id,
                                model = %candidate.model_id,
                                forwarded,
                                "discarding partial output of failed attempt"
                            );
                            yield Ok(TextEvent::Restart);
                        }
                    }
                }
            }

            yield Err(exhausted(last_error));
        };
        Box::pin(s)
    }

    /// Generate the complete explanation.
    ///
    /// Each attempt is the adapter's collected stream under the same time
    /// budget as [`generate_stream`](Self::generate_stream), so both modes
    /// return the same text for the same provider behavior.
    pub async fn generate_complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let prompt = build_prompt(request.topic(), request.level());
        let params = request.sampling();
        let mut last_error: Option<ProviderError> = None;

        for attempt in Cascade::new(self) {
            let candidate = &attempt.candidate;
            attempt.log_start(request.level().as_str());
            let deadline = Instant::now() + self.request_timeout;

            let result = tokio::time::timeout_at(
                deadline,
                candidate
                    .adapter
                    .generate_complete(&candidate.model_id, &prompt, &params),
            )
            .await
            .unwrap_or_else(|_| Err(self.timeout_error(candidate)));

            match result {
                Ok(text) => {
                    attempt.log_success(1);
                    return Ok(text);
                }
                Err(e) => {
                    self.record_failure(&attempt, &e);
                    last_error = Some(e);
                }
            }
        }

        Err(exhausted(last_error))
    }

    fn timeout_error(&self, candidate: &ProviderCandidate) -> ProviderError {
        ProviderError::timeout(
            candidate.provider_id.clone(),
            Some(candidate.model_id.as_str()),
            self.request_timeout,
        )
    }

    fn record_failure(&self, attempt: &Attempt, error: &ProviderError) {
        let candidate = &attempt.candidate;
        if attempt.primary {
            // No alternate primary models, so a 429 here only gets logged.
            tracing::warn!(
                provider = %candidate.provider_id,
                model = %candidate.model_id,
                status = ?error.status,
                rate_limited = error.is_rate_limited(),
                retry_after_ms = ?error.retry_after_ms(),
                error = %error,
                "primary provider failed, falling back"
            );
            return;
        }

        tracing::warn!(
            provider = %candidate.provider_id,
            model = %candidate.model_id,
            status = ?error.status,
            error = %error,
            "fallback model failed"
        );
        if error.is_rate_limited() {
            self.availability
                .disable(&candidate.model_id, error.retry_after);
        }
    }
}

impl fmt::Debug for ExplanationGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplanationGenerator")
            .field("primary", &self.primary)
            .field("secondary_provider", &self.secondary.provider_id())
            .field("secondary_models", &self.secondary_models)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn exhausted(last_error: Option<ProviderError>) -> LlmError {
    match last_error {
        Some(e) => {
            tracing::error!(error = %e, "all LLM providers failed");
            LlmError::Provider(e)
        }
        None => {
            tracing::error!("all LLM providers failed without a recorded error");
            LlmError::AllProvidersFailed
        }
    }
}

/// One scheduled attempt.
struct Attempt {
    candidate: ProviderCandidate,
    primary: bool,
}

impl Attempt {
    fn log_start(&self, level: &str) {
        if self.primary {
            tracing::info!(
                provider = %self.candidate.provider_id,
                model = %self.candidate.model_id,
                level,
                "attempting primary provider"
            );
        } else {
            tracing::info!(
                provider = %self.candidate.provider_id,
                model = %self.candidate.model_id,
                level,
                "attempting fallback model"
            );
        }
    }

    fn log_success(&self, fragments: usize) {
        tracing::info!(
            provider = %self.candidate.provider_id,
            model = %self.candidate.model_id,
            primary = self.primary,
            fragments,
            "generation succeeded"
        );
    }
}

/// Lazily yields the primary candidate, then the secondary models.
///
/// The secondary list is filtered through the tracker only once the primary
/// has failed. Each model is re-checked right before its turn, since other
/// requests may have disabled it meanwhile; the check is skipped when every
/// model was cooling down and the full list is being tried anyway.
struct Cascade<'a> {
    generator: &'a ExplanationGenerator,
    position: usize,
    plan: Option<CandidateModels>,
}

impl<'a> Cascade<'a> {
    fn new(generator: &'a ExplanationGenerator) -> Self {
        Self {
            generator,
            position: 0,
            plan: None,
        }
    }
}

impl Iterator for Cascade<'_> {
    type Item = Attempt;

    fn next(&mut self) -> Option<Attempt> {
        let generator = self.generator;
        if self.position == 0 {
            self.position = 1;
            return Some(Attempt {
                candidate: generator.primary.clone(),
                primary: true,
            });
        }

        let plan = self.plan.get_or_insert_with(|| {
            let plan = generator
                .availability
                .available_candidates(&generator.secondary_models[..]);
            if plan.using_fallback {
                tracing::warn!(
                    provider = %generator.secondary.provider_id(),
                    "every fallback model is cooling down, trying all of them"
                );
            }
            plan
        });

        while let Some(model) = plan.models.get(self.position - 1) {
            self.position += 1;
            if !plan.using_fallback && !generator.availability.is_available(model) {
                tracing::info!(
                    provider = %generator.secondary.provider_id(),
                    model = %model,
                    "skipping rate-limited model"
                );
                continue;
            }
            return Some(Attempt {
                candidate: generator.secondary_candidate(model),
                primary: false,
            });
        }
        None
    }
}
