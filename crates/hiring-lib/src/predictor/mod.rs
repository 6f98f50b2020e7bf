//! Prediction engine

mod features;
mod inference;
mod output;
mod ranking;

pub use features::{coerce, FeatureVectorBuilder};
pub use inference::{FallbackPredictor, HiringPredictor, ModelHandle, FALLBACK_VERSION};
pub use output::{MatchExplainer, MAX_CONCERNS, MAX_STRENGTHS};
pub use ranking::{rank_with, UNSCORED_CONFIDENCE, UNSCORED_MATCH_SCORE};

/// Probabilities strictly above this are labeled as a successful match
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Class label for a positive-class probability
pub fn label_for(probability: f64) -> u8 {
    u8::from(probability > DECISION_THRESHOLD)
}
