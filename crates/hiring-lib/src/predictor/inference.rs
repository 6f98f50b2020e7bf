//! Model handle and prediction
//!
//! [`ModelHandle`] owns the currently loaded artifact. Predictions clone an
//! `Arc` snapshot under a short read lock, so a reload never blocks or
//! disturbs in-flight requests.

use super::features::FeatureVectorBuilder;
use super::label_for;
use super::output::MatchExplainer;
use super::ranking::rank_with;
use crate::artifact::{LoadedModel, ModelArtifact};
use crate::error::{HiringError, Result};
use crate::models::{
    Candidate, FeatureMap, MatchInsight, PredictionResult, RankedCandidate, RawFeatures,
};
use crate::schema::{FeatureSchema, SchemaKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// Model version reported by the heuristic scorer
pub const FALLBACK_VERSION: &str = "fallback";

/// Shared, reloadable slot holding the loaded model
#[derive(Debug, Clone, Default)]
pub struct ModelHandle {
    slot: Arc<RwLock<Option<Arc<LoadedModel>>>>,
    source: Option<PathBuf>,
}

impl ModelHandle {
    /// Empty handle with no artifact path
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty handle that reloads from `path`
    pub fn with_source(path: impl Into<PathBuf>) -> Self {
        Self {
            slot: Arc::default(),
            source: Some(path.into()),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Snapshot of the loaded model, if any
    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    pub fn version(&self) -> Option<String> {
        self.current().map(|m| m.version.clone())
    }

    /// Replace the loaded model wholesale
    pub fn install(&self, model: LoadedModel) -> Arc<LoadedModel> {
        let model = Arc::new(model);
        let previous = self
            .slot
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(model.clone());
        info!(
            version = %model.version,
            previous = ?previous.map(|p| p.version.clone()),
            "Model installed"
        );
        model
    }

    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<Arc<LoadedModel>> {
        let loaded = ModelArtifact::load(path)?;
        Ok(self.install(loaded))
    }

    /// Re-read the artifact from the configured source path. On failure the
    /// previously loaded model stays in place.
    pub fn reload(&self) -> Result<Arc<LoadedModel>> {
        let path = self
            .source
            .as_ref()
            .ok_or_else(|| HiringError::Artifact("no artifact path configured".to_string()))?;
        self.load_from(path)
    }

    pub fn unload(&self) {
        self.slot.write().unwrap_or_else(|e| e.into_inner()).take();
    }
}

/// Predicts match probability with the model held by a [`ModelHandle`]
#[derive(Debug, Clone)]
pub struct HiringPredictor {
    handle: ModelHandle,
}

impl HiringPredictor {
    pub fn new(handle: ModelHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    fn model(&self) -> Result<Arc<LoadedModel>> {
        self.handle.current().ok_or(HiringError::ModelUnavailable)
    }

    /// Schema of the loaded model
    pub fn schema(&self) -> Result<FeatureSchema> {
        Ok(self.model()?.schema().clone())
    }

    /// Predict from raw caller input
    pub fn predict(&self, raw: &RawFeatures) -> Result<PredictionResult> {
        let model = self.model()?;
        let vector = FeatureVectorBuilder::new(model.schema().clone()).build_raw(raw)?;
        score(&model, &vector)
    }

    /// Predict from already-numeric values
    pub fn predict_values(&self, values: &FeatureMap) -> Result<PredictionResult> {
        let model = self.model()?;
        let vector = FeatureVectorBuilder::new(model.schema().clone()).build(values);
        score(&model, &vector)
    }

    /// Predict from a vector already in schema order
    pub fn predict_vector(&self, vector: &[f64]) -> Result<PredictionResult> {
        let model = self.model()?;
        score(&model, vector)
    }

    /// Score many schema-ordered vectors against one model snapshot.
    /// Returns the probabilities and the version that produced them.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<(Vec<f64>, String)> {
        let model = self.model()?;
        let probabilities = rows
            .iter()
            .map(|row| model.forest().predict_proba(row))
            .collect::<Result<Vec<f64>>>()?;
        Ok((probabilities, model.version.clone()))
    }

    /// Explain the supplied features of a raw input. Only smart hiring
    /// models carry the features the explanation rules read.
    pub fn explain(&self, raw: &RawFeatures) -> Result<Option<MatchInsight>> {
        let model = self.model()?;
        if model.schema().kind() != SchemaKind::SmartHiring {
            return Ok(None);
        }
        let values = FeatureVectorBuilder::new(model.schema().clone()).coerce_map(raw)?;
        Ok(Some(MatchExplainer::explain(&values)))
    }

    /// Rank candidates against one model snapshot, highest match first.
    /// Fails only when no model is loaded; a candidate with unusable
    /// features gets the default entry instead.
    pub fn rank(&self, candidates: &[Candidate]) -> Result<(Vec<RankedCandidate>, String)> {
        let model = self.model()?;
        let builder = FeatureVectorBuilder::new(model.schema().clone());
        let explains = model.schema().kind() == SchemaKind::SmartHiring;

        let ranked = rank_with(candidates, |candidate| {
            let vector = builder.build_raw(&candidate.features)?;
            let probability = model.forest().predict_proba(&vector)?;
            let insight = if explains {
                Some(MatchExplainer::explain(&builder.coerce_map(&candidate.features)?))
            } else {
                None
            };
            Ok((probability, insight))
        });
        debug!(candidates = candidates.len(), version = %model.version, "Candidates ranked");
        Ok((ranked, model.version.clone()))
    }
}

fn score(model: &LoadedModel, vector: &[f64]) -> Result<PredictionResult> {
    let start = Instant::now();
    let probability = model.forest().predict_proba(vector)?;
    debug!(
        elapsed_us = start.elapsed().as_micros() as u64,
        version = %model.version,
        "Inference completed"
    );
    Ok(PredictionResult {
        label: label_for(probability),
        probability,
        model_version: model.version.clone(),
    })
}

/// Weighted heuristic used when no trained model is available
#[derive(Debug, Clone)]
pub struct FallbackPredictor {
    builder: FeatureVectorBuilder,
}

impl Default for FallbackPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackPredictor {
    const WEIGHTS: [(&'static str, f64, f64); 7] = [
        // (feature, divisor, weight)
        ("skill_match_score", 1.0, 0.25),
        ("avg_rating", 5.0, 0.20),
        ("recommendation_rate", 1.0, 0.15),
        ("completion_rate", 1.0, 0.15),
        ("bid_success_rate", 1.0, 0.10),
        ("category_experience", 10.0, 0.10),
        ("budget_match_score", 1.0, 0.05),
    ];

    pub fn new() -> Self {
        Self {
            builder: FeatureVectorBuilder::new(FeatureSchema::smart_hiring()),
        }
    }

    /// Heuristic score in [0, 1]
    pub fn score(values: &FeatureMap) -> f64 {
        let score: f64 = Self::WEIGHTS
            .iter()
            .map(|(name, divisor, weight)| values.get(*name).copied().unwrap_or(0.0) / divisor * weight)
            .sum();
        score.clamp(0.0, 1.0)
    }

    pub fn predict(&self, raw: &RawFeatures) -> Result<PredictionResult> {
        let values = self.builder.coerce_map(raw)?;
        let probability = Self::score(&values);
        Ok(PredictionResult {
            label: label_for(probability),
            probability,
            model_version: FALLBACK_VERSION.to_string(),
        })
    }

    pub fn explain(&self, raw: &RawFeatures) -> Result<MatchInsight> {
        Ok(MatchExplainer::explain(&self.builder.coerce_map(raw)?))
    }

    pub fn rank(&self, candidates: &[Candidate]) -> Vec<RankedCandidate> {
        rank_with(candidates, |candidate| {
            let values = self.builder.coerce_map(&candidate.features)?;
            Ok((Self::score(&values), Some(MatchExplainer::explain(&values))))
        })
    }
}
