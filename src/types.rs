//! Core request types
//!
//! Complexity levels, their fixed generation settings, and the immutable
//! [`GenerationRequest`] handed to the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::LlmError;

/// Sampling parameter shared by every level and provider.
pub const TOP_K: u32 = 40;
/// Sampling parameter shared by every level and provider.
pub const TOP_P: f32 = 0.95;
/// Output token budget shared by every level.
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// One of the four explanation depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ComplexityLevel {
    /// All levels, shallowest first.
    pub const ALL: [ComplexityLevel; 4] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Advanced,
        Self::Expert,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Beginner => "Like explaining to a 5-year-old",
            Self::Intermediate => "High school level understanding",
            Self::Advanced => "College/undergraduate depth",
            Self::Expert => "Graduate/PhD level detail",
        }
    }

    /// Word ceiling requested by the level's prompt template.
    pub const fn word_limit(self) -> u32 {
        match self {
            Self::Beginner => 200,
            Self::Intermediate => 300,
            Self::Advanced => 400,
            Self::Expert => 500,
        }
    }

    /// Fixed temperature / token budget for this level.
    pub const fn settings(self) -> LevelSettings {
        let temperature = match self {
            Self::Beginner => 0.8,
            Self::Intermediate => 0.6,
            Self::Advanced => 0.4,
            Self::Expert => 0.3,
        };
        LevelSettings {
            temperature,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityLevel {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            other => Err(LlmError::InvalidInput(format!(
                "Invalid level '{other}'. Must be one of: beginner, intermediate, advanced, expert"
            ))),
        }
    }
}

/// Per-level generation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Parameters passed to a provider adapter for one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
}

impl SamplingParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            top_k: TOP_K,
            top_p: TOP_P,
        }
    }
}

/// A validated (topic, level) generation request.
#[derive(Debug, Clone, PartialEq, Validate, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[validate(length(min = 1, message = "topic must not be empty"))]
    topic: String,
    level: ComplexityLevel,
    #[validate(range(min = 0.0, max = 2.0))]
    temperature: Option<f32>,
    #[validate(range(min = 1, max = 8192))]
    max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Build a request using the level's default settings.
    pub fn new(topic: impl Into<String>, level: ComplexityLevel) -> Result<Self, LlmError> {
        Self::with_overrides(topic, level, None, None)
    }

    /// Build a request with optional temperature / token overrides.
    pub fn with_overrides(
        topic: impl Into<String>,
        level: ComplexityLevel,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<Self, LlmError> {
        // NaN slips through range checks
        if let Some(t) = temperature.filter(|t| !t.is_finite()) {
            return Err(LlmError::InvalidInput(format!(
                "temperature must be a finite number, got {t}"
            )));
        }
        let request = Self {
            topic: topic.into().trim().to_string(),
            level,
            temperature,
            max_tokens,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn level(&self) -> ComplexityLevel {
        self.level
    }

    pub fn temperature_override(&self) -> Option<f32> {
        self.temperature
    }

    pub fn max_tokens_override(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Effective sampling parameters: overrides win over the level table.
    pub fn sampling(&self) -> SamplingParams {
        let settings = self.level.settings();
        SamplingParams::new(
            self.temperature.unwrap_or(settings.temperature),
            self.max_tokens.unwrap_or(settings.max_tokens),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_table_matches_fixed_settings() {
        let temps: Vec<f32> = ComplexityLevel::ALL
            .iter()
            .map(|l| l.settings().temperature)
            .collect();
        assert_eq!(temps, vec![0.8, 0.6, 0.4, 0.3]);
        assert!(
            ComplexityLevel::ALL
                .iter()
                .all(|l| l.settings().max_tokens == 800)
        );
    }

    #[test]
    fn level_parsing_and_serde() {
        assert_eq!(
            "Expert".parse::<ComplexityLevel>().unwrap(),
            ComplexityLevel::Expert
        );
        assert!(matches!(
            "genius".parse::<ComplexityLevel>(),
            Err(LlmError::InvalidInput(_))
        ));
        let json = serde_json::to_string(&ComplexityLevel::Intermediate).unwrap();
        assert_eq!(json, "\"intermediate\"");
    }

    #[test]
    fn request_rejects_blank_topic() {
        assert!(GenerationRequest::new("   ", ComplexityLevel::Beginner).is_err());
        let req = GenerationRequest::new("  Rust  ", ComplexityLevel::Beginner).unwrap();
        assert_eq!(req.topic(), "Rust");
    }

    #[test]
    fn request_rejects_out_of_range_overrides() {
        assert!(
            GenerationRequest::with_overrides("x", ComplexityLevel::Expert, Some(3.5), None)
                .is_err()
        );
        assert!(
            GenerationRequest::with_overrides("x", ComplexityLevel::Expert, None, Some(0)).is_err()
        );
    }

    #[test]
    fn request_rejects_non_finite_temperature() {
        for t in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = GenerationRequest::with_overrides("x", ComplexityLevel::Beginner, Some(t), None)
                .unwrap_err();
            assert!(matches!(err, LlmError::InvalidInput(_)), "{t} accepted");
        }
    }

    #[test]
    fn overrides_win_over_level_table() {
        let req = GenerationRequest::with_overrides(
            "Entropy",
            ComplexityLevel::Advanced,
            Some(1.1),
            None,
        )
        .unwrap();
        let params = req.sampling();
        assert_eq!(params.temperature, 1.1);
        assert_eq!(params.max_tokens, 800);
        assert_eq!(params.top_k, 40);
        assert_eq!(params.top_p, 0.95);
    }
}
