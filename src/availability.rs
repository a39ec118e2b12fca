//! Model availability tracking
//!
//! Shared rate-limit memory: when a model answers 429, it is skipped by every
//! request until its cooldown elapses. The map is guarded by a plain mutex;
//! a racing request may still attempt a model that was just disabled, which
//! the provider simply rejects again.
//!
//! Time comes from `tokio::time::Instant`, so tests can pause and advance
//! the clock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::AvailabilityConfig;

/// Result of filtering a model list through the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateModels {
    /// Models to attempt, in configured order
    pub models: Vec<String>,
    /// Every model was cooling down, so the full list is returned anyway
    pub using_fallback: bool,
}

/// Per-model "disabled until" registry.
#[derive(Debug, Default)]
pub struct ModelAvailability {
    config: AvailabilityConfig,
    disabled_until: Mutex<HashMap<String, Instant>>,
}

impl ModelAvailability {
    pub fn new(config: AvailabilityConfig) -> Self {
        Self {
            config,
            disabled_until: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> AvailabilityConfig {
        self.config
    }

    // A poisoned map is still structurally valid; keep serving it.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.disabled_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True when the model has no cooldown or its cooldown has passed.
    /// Expired entries are purged.
    pub fn is_available(&self, model_id: &str) -> bool {
        let mut entries = self.entries();
        match entries.get(model_id) {
            None => true,
            Some(until) if *until <= Instant::now() => {
                entries.remove(model_id);
                true
            }
            Some(_) => false,
        }
    }

    /// Put a model on cooldown for `retry_after` (or the default backoff)
    /// plus the safety buffer. Overwrites any earlier cooldown.
    ///
    /// Returns the applied backoff.
    pub fn disable(&self, model_id: &str, retry_after: Option<Duration>) -> Duration {
        let backoff = retry_after.unwrap_or(self.config.default_backoff) + self.config.safety_buffer;
        self.entries()
            .insert(model_id.to_string(), Instant::now() + backoff);
        tracing::warn!(
            model = %model_id,
            backoff_ms = backoff.as_millis() as u64,
            "temporarily disabling model due to rate limit"
        );
        backoff
    }

    /// When the model becomes available again, if it is cooling down.
    pub fn disabled_until(&self, model_id: &str) -> Option<Instant> {
        self.entries()
            .get(model_id)
            .copied()
            .filter(|until| *until > Instant::now())
    }

    /// Available models in input order; the full list when none are available.
    pub fn available_candidates<S: AsRef<str>>(&self, all_models: &[S]) -> CandidateModels {
        let models: Vec<String> = all_models
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| self.is_available(m))
            .map(str::to_string)
            .collect();

        if models.is_empty() && !all_models.is_empty() {
            return CandidateModels {
                models: all_models.iter().map(|m| m.as_ref().to_string()).collect(),
                using_fallback: true,
            };
        }

        CandidateModels {
            models,
            using_fallback: false,
        }
    }

    /// Drop every cooldown.
    pub fn clear(&self) {
        self.entries().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ModelAvailability {
        ModelAvailability::new(AvailabilityConfig {
            default_backoff: Duration::from_millis(5000),
            safety_buffer: Duration::from_millis(500),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_model_is_available() {
        assert!(tracker().is_available("gemini-2.5-flash"));
    }

    #[tokio::test(start_paused = true)]
    async fn disable_uses_retry_hint_plus_buffer() {
        let t = tracker();
        let backoff = t.disable("m", Some(Duration::from_millis(2000)));
        assert_eq!(backoff, Duration::from_millis(2500));
        tokio::time::advance(Duration::from_millis(2499)).await;
        assert!(!t.is_available("m"));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(t.is_available("m"));
        // expired entry was purged
        assert!(t.disabled_until("m").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn disable_without_hint_uses_default_backoff() {
        let t = tracker();
        assert_eq!(t.disable("m", None), Duration::from_millis(5500));
        tokio::time::advance(Duration::from_millis(5400)).await;
        assert!(!t.is_available("m"));
    }

    #[tokio::test(start_paused = true)]
    async fn last_disable_wins() {
        let t = tracker();
        let start = Instant::now();
        t.disable("m", Some(Duration::from_millis(1000)));
        t.disable("m", Some(Duration::from_millis(5000)));
        assert_eq!(
            t.disabled_until("m"),
            Some(start + Duration::from_millis(5500))
        );

        // a shorter second call also overwrites
        t.disable("m", Some(Duration::from_millis(100)));
        assert_eq!(
            t.disabled_until("m"),
            Some(start + Duration::from_millis(600))
        );
    }

    #[tokio::test(start_paused = true)]
    #[tracing_test::traced_test]
    async fn disable_is_logged_with_backoff() {
        tracker().disable("gemini-2.0-flash-exp", Some(Duration::from_millis(1500)));
        assert!(logs_contain("temporarily disabling model"));
        assert!(logs_contain("backoff_ms=2000"));
    }

    #[tokio::test(start_paused = true)]
    async fn candidates_preserve_order() {
        let t = tracker();
        t.disable("b", None);
        let c = t.available_candidates(&["a", "b", "c"]);
        assert_eq!(c.models, vec!["a", "c"]);
        assert!(!c.using_fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn all_disabled_falls_back_to_full_list() {
        let t = tracker();
        t.disable("a", None);
        t.disable("b", None);
        let c = t.available_candidates(&["a", "b"]);
        assert_eq!(c.models, vec!["a", "b"]);
        assert!(c.using_fallback);
    }
}
