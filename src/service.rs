//! Explanation service
//!
//! Transport-agnostic request handling: slug the topic, serve what the cache
//! already has, and stream generation for the missing levels while saving
//! each finished level. HTTP framing lives in `server_adapters`.

use futures::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::LlmError;
use crate::orchestrator::ExplanationGenerator;
use crate::slug::{create_slug, slug_to_title};
use crate::store::{DEFAULT_SEARCH_LIMIT, Explanation, ExplanationStore, Topic};
use crate::stream::TextEvent;
use crate::types::{ComplexityLevel, GenerationRequest};

/// One server-sent event of an explanation stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelEvent {
    /// A generated fragment (`done: false, cached: false`).
    Chunk {
        level: ComplexityLevel,
        chunk: String,
        done: bool,
        cached: bool,
    },
    /// A whole explanation served from the cache (`done: true, cached: true`).
    Cached {
        level: ComplexityLevel,
        content: String,
        done: bool,
        cached: bool,
    },
    /// The chunks sent so far for `level` are void; generation restarts
    /// with another model (`restart: true, done: false`).
    Restart {
        level: ComplexityLevel,
        restart: bool,
        done: bool,
        cached: bool,
    },
    /// A level finished generating and was saved (`done: true, cached: false`).
    Done {
        level: ComplexityLevel,
        done: bool,
        cached: bool,
    },
    /// Generation or storage failed; nothing follows.
    Error { error: String },
}

impl LevelEvent {
    pub fn chunk(level: ComplexityLevel, chunk: impl Into<String>) -> Self {
        Self::Chunk {
            level,
            chunk: chunk.into(),
            done: false,
            cached: false,
        }
    }

    pub fn cached(level: ComplexityLevel, content: impl Into<String>) -> Self {
        Self::Cached {
            level,
            content: content.into(),
            done: true,
            cached: true,
        }
    }

    pub fn restart(level: ComplexityLevel) -> Self {
        Self::Restart {
            level,
            restart: true,
            done: false,
            cached: false,
        }
    }

    pub fn done(level: ComplexityLevel) -> Self {
        Self::Done {
            level,
            done: true,
            cached: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

pub type LevelEventStream = Pin<Box<dyn Stream<Item = LevelEvent> + Send>>;

/// Every requested level served from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedExplanations {
    pub topic_slug: String,
    pub topic_title: String,
    pub explanations: Vec<Explanation>,
    pub cached: bool,
}

/// Result of [`ExplanationService::explain`].
pub enum ExplainOutcome {
    Cached(CachedExplanations),
    Streaming {
        topic_slug: String,
        topic_title: String,
        events: LevelEventStream,
    },
}

impl std::fmt::Debug for ExplainOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cached(c) => f.debug_tuple("Cached").field(c).finish(),
            Self::Streaming { topic_slug, .. } => f
                .debug_struct("Streaming")
                .field("topic_slug", topic_slug)
                .finish_non_exhaustive(),
        }
    }
}

/// Cache-aware explanation service.
pub struct ExplanationService<S> {
    generator: ExplanationGenerator,
    store: Arc<S>,
}

impl<S> Clone for ExplanationService<S> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S> ExplanationService<S>
where
    S: ExplanationStore + 'static,
{
    pub fn new(generator: ExplanationGenerator, store: Arc<S>) -> Self {
        Self { generator, store }
    }

    pub fn generator(&self) -> &ExplanationGenerator {
        &self.generator
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Explain `topic` at `levels` (all four when `None`).
    ///
    /// Returns the cached set when every requested level is fresh in the
    /// store. Otherwise returns a stream that replays cached levels and
    /// generates the rest in the requested order. Either way the topic's view
    /// count is bumped.
    pub async fn explain(
        &self,
        topic: &str,
        levels: Option<&[ComplexityLevel]>,
    ) -> Result<ExplainOutcome, LlmError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(LlmError::InvalidInput("Topic is required".to_string()));
        }
        let topic_slug = create_slug(topic);
        if topic_slug.is_empty() {
            return Err(LlmError::InvalidInput(format!(
                "Topic '{topic}' has no letters or digits"
            )));
        }
        let topic_title = slug_to_title(&topic_slug);
        let levels: Vec<ComplexityLevel> = match levels {
            Some(levels) if !levels.is_empty() => levels.to_vec(),
            _ => ComplexityLevel::ALL.to_vec(),
        };

        let cached = self.store.get_cached(&topic_slug).await?.unwrap_or_default();
        let mut by_level: HashMap<ComplexityLevel, Explanation> = cached
            .iter()
            .map(|e| (e.complexity_level, e.clone()))
            .collect();

        self.store
            .get_or_create_topic(&topic_slug, &topic_title)
            .await?;

        if !cached.is_empty() && levels.iter().all(|l| by_level.contains_key(l)) {
            tracing::info!(slug = %topic_slug, "serving every level from cache");
            return Ok(ExplainOutcome::Cached(CachedExplanations {
                topic_slug,
                topic_title,
                explanations: cached,
                cached: true,
            }));
        }

        let generator = self.generator.clone();
        let store = self.store.clone();
        let slug = topic_slug.clone();
        let title = topic_title.clone();
        let events = async_stream::stream! {
            for level in levels {
                if let Some(hit) = by_level.remove(&level) {
                    yield LevelEvent::cached(level, hit.content);
                    continue;
                }

                let request = match GenerationRequest::new(title.as_str(), level) {
                    Ok(request) => request,
                    Err(e) => {
                        yield LevelEvent::error(e.to_string());
                        return;
                    }
                };

                let mut content = String::new();
                let mut fragments = generator.generate_stream(&request);
                while let Some(event) = fragments.next().await {
                    match event {
                        Ok(TextEvent::Fragment(text)) => {
                            content.push_str(&text);
                            yield LevelEvent::chunk(level, text);
                        }
                        Ok(TextEvent::Restart) => {
                            content.clear();
                            yield LevelEvent::restart(level);
                        }
                        Err(e) => {
                            tracing::error!(slug = %slug, level = %level, error = %e, "streaming failed");
                            yield LevelEvent::error(e.to_string());
                            return;
                        }
                    }
                }

                if let Err(e) = store.save(&slug, &title, level, &content).await {
                    tracing::error!(slug = %slug, level = %level, error = %e, "failed to save explanation");
                    yield LevelEvent::error(e.to_string());
                    return;
                }
                yield LevelEvent::done(level);
            }
        };

        Ok(ExplainOutcome::Streaming {
            topic_slug,
            topic_title,
            events: Box::pin(events),
        })
    }

    /// Regenerate a single level in buffered mode and store it.
    pub async fn retry_level(
        &self,
        topic: &str,
        topic_slug: &str,
        level: ComplexityLevel,
    ) -> Result<Explanation, LlmError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(LlmError::InvalidInput("Topic is required".to_string()));
        }
        if topic_slug.trim().is_empty() {
            return Err(LlmError::InvalidInput("Topic slug is required".to_string()));
        }

        tracing::info!(slug = %topic_slug, level = %level, "retrying single level");
        self.store.get_or_create_topic(topic_slug, topic).await?;

        let request = GenerationRequest::new(topic, level)?;
        let content = self.generator.generate_complete(&request).await?;
        let explanation = self.store.save(topic_slug, topic, level, &content).await?;
        tracing::info!(slug = %topic_slug, level = %level, "level regenerated");
        Ok(explanation)
    }

    /// Fresh cached explanations for a slug, without touching view counts.
    pub async fn cached(&self, topic_slug: &str) -> Result<Option<CachedExplanations>, LlmError> {
        let Some(explanations) = self.store.get_cached(topic_slug).await? else {
            return Ok(None);
        };
        let topic_title = explanations
            .first()
            .map(|e| e.topic_title.clone())
            .unwrap_or_else(|| slug_to_title(topic_slug));
        Ok(Some(CachedExplanations {
            topic_slug: topic_slug.to_string(),
            topic_title,
            explanations,
            cached: true,
        }))
    }

    pub async fn trending_topics(&self, limit: usize) -> Result<Vec<Topic>, LlmError> {
        self.store.trending_topics(limit).await
    }

    /// Blank queries return no topics.
    pub async fn search_topics(&self, query: &str) -> Result<Vec<Topic>, LlmError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search_topics(query, DEFAULT_SEARCH_LIMIT).await
    }
}
