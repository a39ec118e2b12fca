//! # explain-levels - Multi-provider explanation generation
//!
//! Generates explanations of a topic at four complexity levels by calling
//! upstream LLM providers, with deterministic fallback and shared
//! rate-limit memory.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Ordered fallback**: Groq is tried once, then each Gemini model in priority order.
//! - **Rate-limit memory**: a model that answers 429 is skipped by every request until its cooldown passes.
//! - **Streaming and buffered**: fragments as they arrive, or the complete text, from the same cascade.
//! - **Bounded calls**: every attempt has a time budget; timeouts fall through like any other failure.
//! - **Cache-aware service**: a persistence contract, an in-memory store, and SSE framing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use explain_levels::prelude::*;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let _guard = explain_levels::telemetry::init_from_env()?;
//!     let generator = ExplanationGenerator::from_config(&GenerationConfig::from_env()?)?;
//!
//!     let request = GenerationRequest::new("Quantum Computing", ComplexityLevel::Beginner)?;
//!     let mut stream = generator.generate_stream(&request);
//!     while let Some(event) = stream.next().await {
//!         if let TextEvent::Fragment(text) = event? {
//!             print!("{text}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod availability;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod providers;
pub mod server_adapters;
pub mod service;
pub mod slug;
pub mod store;
pub mod stream;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use availability::{CandidateModels, ModelAvailability};
pub use config::{AvailabilityConfig, GeminiConfig, GenerationConfig, GroqConfig};
pub use error::{LlmError, ProviderError};
pub use orchestrator::ExplanationGenerator;
pub use prompt::build_prompt;
pub use providers::{
    GeminiAdapter, GroqAdapter, ProviderAdapter, ProviderAdapterExt, ProviderCandidate,
};
pub use service::{ExplainOutcome, ExplanationService, LevelEvent};
pub use store::{Explanation, ExplanationStore, InMemoryStore, Topic};
pub use stream::{FragmentStream, TextEvent, TextStream, collect, collect_text};
pub use types::{ComplexityLevel, GenerationRequest, SamplingParams};

/// Commonly used types
pub mod prelude {
    pub use crate::availability::ModelAvailability;
    pub use crate::config::{AvailabilityConfig, GeminiConfig, GenerationConfig, GroqConfig};
    pub use crate::error::{LlmError, ProviderError};
    pub use crate::orchestrator::ExplanationGenerator;
    pub use crate::providers::{ProviderAdapter, ProviderAdapterExt, ProviderCandidate};
    pub use crate::service::{ExplainOutcome, ExplanationService, LevelEvent};
    pub use crate::store::{ExplanationStore, InMemoryStore};
    pub use crate::stream::{FragmentStream, TextEvent, TextStream, collect_text};
    pub use crate::types::{ComplexityLevel, GenerationRequest, SamplingParams};
    pub use crate::utils::{CancelHandle, make_cancellable};
}
