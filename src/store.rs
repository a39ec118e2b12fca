//! Explanation persistence contract
//!
//! The generation core never touches storage; the service layer consults an
//! [`ExplanationStore`] before generating and saves what it produced.
//! [`InMemoryStore`] is a process-local implementation suitable for tests
//! and single-instance deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::LlmError;
use crate::types::ComplexityLevel;

/// Cached explanations older than this are treated as absent.
pub const DEFAULT_CACHE_TTL_DAYS: i64 = 30;
pub const DEFAULT_TRENDING_LIMIT: usize = 12;
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// A stored explanation for one (topic, level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub id: Uuid,
    pub topic_slug: String,
    pub topic_title: String,
    pub complexity_level: ComplexityLevel,
    pub content: String,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
}

/// Topic usage record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub view_count: u64,
    pub last_generated: DateTime<Utc>,
    pub is_trending: bool,
    pub created_at: DateTime<Utc>,
}

/// Whitespace-separated word count.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Persistence contract consumed by the explanation service.
#[async_trait]
pub trait ExplanationStore: Send + Sync {
    /// Fresh explanations for a topic; `None` when nothing within the TTL.
    /// A hit bumps `last_accessed` and `access_count` of every returned entry.
    async fn get_cached(&self, topic_slug: &str) -> Result<Option<Vec<Explanation>>, LlmError>;

    /// Store generated content; the store assigns id and timestamps.
    async fn save(
        &self,
        topic_slug: &str,
        topic_title: &str,
        level: ComplexityLevel,
        content: &str,
    ) -> Result<Explanation, LlmError>;

    /// Create the topic with one view, or count another view.
    async fn get_or_create_topic(&self, slug: &str, title: &str) -> Result<(), LlmError>;

    async fn get_topic(&self, slug: &str) -> Result<Option<Topic>, LlmError>;

    /// Most viewed topics first.
    async fn trending_topics(&self, limit: usize) -> Result<Vec<Topic>, LlmError>;

    /// Case-insensitive substring match on title or slug, most viewed first.
    async fn search_topics(&self, query: &str, limit: usize) -> Result<Vec<Topic>, LlmError>;
}

#[derive(Debug, Default)]
struct StoreState {
    // keyed by (slug, level); saving the same level again replaces it
    explanations: HashMap<(String, ComplexityLevel), Explanation>,
    topics: HashMap<String, Topic>,
}

/// In-process [`ExplanationStore`].
#[derive(Debug)]
pub struct InMemoryStore {
    ttl: chrono::Duration,
    state: RwLock<StoreState>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_ttl(chrono::Duration::days(DEFAULT_CACHE_TTL_DAYS))
    }

    pub fn with_ttl(ttl: chrono::Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Number of stored explanations, expired ones included.
    pub async fn len(&self) -> usize {
        self.state.read().await.explanations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn ranked(mut topics: Vec<Topic>, limit: usize) -> Vec<Topic> {
    topics.sort_by(|a, b| {
        b.view_count
            .cmp(&a.view_count)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    topics.truncate(limit);
    topics
}

#[async_trait]
impl ExplanationStore for InMemoryStore {
    async fn get_cached(&self, topic_slug: &str) -> Result<Option<Vec<Explanation>>, LlmError> {
        let now = Utc::now();
        let cutoff = now - self.ttl;
        let mut state = self.state.write().await;

        let mut hits: Vec<Explanation> = state
            .explanations
            .values_mut()
            .filter(|e| e.topic_slug == topic_slug && e.created_at >= cutoff)
            .map(|e| {
                e.last_accessed = now;
                e.access_count += 1;
                e.clone()
            })
            .collect();

        if hits.is_empty() {
            tracing::debug!(slug = %topic_slug, "cache miss");
            return Ok(None);
        }
        hits.sort_by_key(|e| e.complexity_level);
        tracing::debug!(slug = %topic_slug, hits = hits.len(), "cache hit");
        Ok(Some(hits))
    }

    async fn save(
        &self,
        topic_slug: &str,
        topic_title: &str,
        level: ComplexityLevel,
        content: &str,
    ) -> Result<Explanation, LlmError> {
        let now = Utc::now();
        let explanation = Explanation {
            id: Uuid::new_v4(),
            topic_slug: topic_slug.to_string(),
            topic_title: topic_title.to_string(),
            complexity_level: level,
            content: content.to_string(),
            word_count: word_count(content),
            created_at: now,
            last_accessed: now,
            access_count: 0,
        };
        self.state
            .write()
            .await
            .explanations
            .insert((topic_slug.to_string(), level), explanation.clone());
        tracing::debug!(slug = %topic_slug, level = %level, words = explanation.word_count, "explanation saved");
        Ok(explanation)
    }

    async fn get_or_create_topic(&self, slug: &str, title: &str) -> Result<(), LlmError> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state
            .topics
            .entry(slug.to_string())
            .and_modify(|topic| {
                topic.view_count += 1;
                topic.last_generated = now;
            })
            .or_insert_with(|| Topic {
                id: Uuid::new_v4(),
                slug: slug.to_string(),
                title: title.to_string(),
                view_count: 1,
                last_generated: now,
                is_trending: false,
                created_at: now,
            });
        Ok(())
    }

    async fn get_topic(&self, slug: &str) -> Result<Option<Topic>, LlmError> {
        Ok(self.state.read().await.topics.get(slug).cloned())
    }

    async fn trending_topics(&self, limit: usize) -> Result<Vec<Topic>, LlmError> {
        let topics = self.state.read().await.topics.values().cloned().collect();
        Ok(ranked(topics, limit))
    }

    async fn search_topics(&self, query: &str, limit: usize) -> Result<Vec<Topic>, LlmError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let topics = self
            .state
            .read()
            .await
            .topics
            .values()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle) || t.slug.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(ranked(topics, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn save_then_hit_bumps_access() {
        let store = InMemoryStore::new();
        let saved = store
            .save("rust", "Rust", ComplexityLevel::Beginner, "Rust is  a\nlanguage")
            .await
            .unwrap();
        assert_eq!(saved.word_count, 4);
        assert_eq!(saved.access_count, 0);

        let hits = store.get_cached("rust").await.unwrap().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, saved.id);
        assert_eq!(hits[0].access_count, 1);
        assert!(hits[0].last_accessed >= saved.last_accessed);

        let hits = store.get_cached("rust").await.unwrap().unwrap();
        assert_eq!(hits[0].access_count, 2);
    }

    #[tokio::test]
    async fn miss_and_expiry() {
        let store = InMemoryStore::with_ttl(chrono::Duration::milliseconds(1));
        assert!(store.get_cached("gone").await.unwrap().is_none());

        store
            .save("gone", "Gone", ComplexityLevel::Expert, "text")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.get_cached("gone").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn hits_are_ordered_by_level_and_resaves_replace() {
        let store = InMemoryStore::new();
        store.save("t", "T", ComplexityLevel::Expert, "e").await.unwrap();
        store.save("t", "T", ComplexityLevel::Beginner, "b1").await.unwrap();
        store.save("t", "T", ComplexityLevel::Beginner, "b2").await.unwrap();

        let hits = store.get_cached("t").await.unwrap().unwrap();
        let levels: Vec<_> = hits.iter().map(|e| e.complexity_level).collect();
        assert_eq!(levels, vec![ComplexityLevel::Beginner, ComplexityLevel::Expert]);
        assert_eq!(hits[0].content, "b2");
    }

    #[tokio::test]
    async fn topic_views_trending_and_search() {
        let store = InMemoryStore::new();
        store.get_or_create_topic("black-holes", "Black Holes").await.unwrap();
        store.get_or_create_topic("black-holes", "Black Holes").await.unwrap();
        store.get_or_create_topic("dna", "Dna").await.unwrap();

        let topic = store.get_topic("black-holes").await.unwrap().unwrap();
        assert_eq!(topic.view_count, 2);
        assert!(!topic.is_trending);

        let trending = store.trending_topics(DEFAULT_TRENDING_LIMIT).await.unwrap();
        let slugs: Vec<_> = trending.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["black-holes", "dna"]);

        let found = store.search_topics("HOLE", DEFAULT_SEARCH_LIMIT).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(store.search_topics("  ", 5).await.unwrap().is_empty());
        assert_eq!(store.trending_topics(1).await.unwrap().len(), 1);
    }

    #[test]
    fn explanation_serializes_camel_case() {
        let now = Utc::now();
        let e = Explanation {
            id: Uuid::nil(),
            topic_slug: "a".into(),
            topic_title: "A".into(),
            complexity_level: ComplexityLevel::Advanced,
            content: "x".into(),
            word_count: 1,
            created_at: now,
            last_accessed: now,
            access_count: 0,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["topicSlug"], "a");
        assert_eq!(json["complexityLevel"], "advanced");
        assert_eq!(json["wordCount"], 1);
    }
}
