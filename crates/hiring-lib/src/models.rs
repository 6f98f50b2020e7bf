//! Core data models for the hiring predictor

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Numeric feature values keyed by feature name
pub type FeatureMap = HashMap<String, f64>;

/// Caller-supplied feature values before numeric coercion
pub type RawFeatures = HashMap<String, serde_json::Value>;

/// A labeled training example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub features: FeatureMap,
    /// Hired / successful match
    pub successful: bool,
}

impl TrainingRow {
    pub fn new(features: FeatureMap, successful: bool) -> Self {
        Self {
            features,
            successful,
        }
    }

    /// Build a row from (name, value) pairs
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
        successful: bool,
    ) -> Self {
        let features = pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self::new(features, successful)
    }

    pub fn label(&self) -> u8 {
        u8::from(self.successful)
    }
}

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class: 1 = successful match
    pub label: u8,
    /// Probability of the positive class, in [0, 1]
    pub probability: f64,
    pub model_version: String,
}

impl PredictionResult {
    /// Probability as a percentage rounded to two decimals
    pub fn probability_percent(&self) -> f64 {
        (self.probability * 10_000.0).round() / 100.0
    }
}

/// Human-readable explanation attached to a match score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInsight {
    pub confidence: f32,
    pub reasoning: String,
    pub key_strengths: Vec<String>,
    pub potential_concerns: Vec<String>,
}

/// A candidate submitted for ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub features: RawFeatures,
}

/// One entry of a ranked candidate list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub id: String,
    /// Match probability in [0, 1]
    pub match_score: f64,
    pub label: u8,
    /// False when the candidate could not be scored and got the default entry
    pub scored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<MatchInsight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_row_from_pairs() {
        let row = TrainingRow::from_pairs([("skills", 5.0), ("budget", 1000.0)], true);
        assert_eq!(row.features["skills"], 5.0);
        assert_eq!(row.label(), 1);
    }

    #[test]
    fn test_probability_percent_rounding() {
        let result = PredictionResult {
            label: 1,
            probability: 0.873_456,
            model_version: "test".to_string(),
        };
        assert_eq!(result.probability_percent(), 87.35);
    }
}
