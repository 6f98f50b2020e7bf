//! Training orchestration
//!
//! Splits labeled rows into train/holdout partitions with a fixed seed, fits
//! the random forest on the training partition, evaluates the holdout and
//! packages everything into a [`ModelArtifact`].

mod dataset;
mod metrics;
mod sample;
mod split;

pub use dataset::{load_csv, load_csv_with_label, read_rows, write_csv, write_rows};
pub use metrics::{mean_std, roc_auc, ConfusionMatrix};
pub use sample::{generate_sample_rows, pad_with_samples, MIN_REAL_ROWS};
pub use split::{holdout_size, train_holdout_split, Partition};

use crate::artifact::{LoadedModel, ModelArtifact};
use crate::error::{HiringError, Result};
use crate::forest::{ForestParams, RandomForest, DEFAULT_SEED};
use crate::models::TrainingRow;
use crate::predictor::FeatureVectorBuilder;
use crate::schema::{FeatureSchema, SchemaKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Fewest labeled rows a forest can be fit on
pub const MIN_TRAINING_ROWS: usize = 2;

/// Training run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub schema: FeatureSchema,
    pub params: ForestParams,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    pub stratify: bool,
    /// k-fold cross-validation on the training partition; below 2 disables it
    pub cv_folds: usize,
    pub split_seed: u64,
}

impl TrainingConfig {
    pub fn smart_hiring() -> Self {
        Self {
            schema: FeatureSchema::smart_hiring(),
            params: ForestParams::smart_hiring(),
            test_size: 0.2,
            stratify: true,
            cv_folds: 0,
            split_seed: DEFAULT_SEED,
        }
    }

    pub fn legacy() -> Self {
        Self {
            schema: FeatureSchema::legacy(),
            params: ForestParams::legacy(),
            test_size: 0.3,
            stratify: false,
            cv_folds: 0,
            split_seed: DEFAULT_SEED,
        }
    }

    pub fn for_schema(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::SmartHiring => Self::smart_hiring(),
            SchemaKind::Legacy => Self::legacy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldoutMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: Option<f64>,
    pub confusion: ConfusionMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub folds: usize,
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Summary of a training run, stored alongside the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub positive_rate: f64,
    pub train_accuracy: f64,
    pub holdout: Option<HoldoutMetrics>,
    pub cross_validation: Option<CrossValidation>,
    /// Sorted by importance, descending
    pub feature_importances: Vec<FeatureImportance>,
    pub duration_ms: u64,
}

impl TrainingReport {
    pub fn holdout_accuracy(&self) -> Option<f64> {
        self.holdout.as_ref().map(|h| h.accuracy)
    }

    pub fn top_features(&self, n: usize) -> &[FeatureImportance] {
        &self.feature_importances[..n.min(self.feature_importances.len())]
    }
}

/// Runs the batch training pipeline
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
    builder: FeatureVectorBuilder,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        let builder = FeatureVectorBuilder::new(config.schema.clone());
        Self { config, builder }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit a model on `rows` and evaluate it on the holdout partition
    pub fn train(&self, rows: &[TrainingRow]) -> Result<ModelArtifact> {
        if rows.len() < MIN_TRAINING_ROWS {
            return Err(HiringError::InsufficientData {
                rows: rows.len(),
                min: MIN_TRAINING_ROWS,
            });
        }
        let start = Instant::now();

        let x: Vec<Vec<f64>> = rows.iter().map(|r| self.builder.build(&r.features)).collect();
        let y: Vec<bool> = rows.iter().map(|r| r.successful).collect();

        let partition = train_holdout_split(
            &y,
            self.config.test_size,
            self.config.stratify,
            self.config.split_seed,
        );
        let (x_train, y_train) = gather(&x, &y, &partition.train);
        let (x_holdout, y_holdout) = gather(&x, &y, &partition.holdout);

        let forest = RandomForest::fit(&x_train, &y_train, &self.config.params)?;

        let train_accuracy = accuracy(&forest, &x_train, &y_train)?;
        let holdout = if x_holdout.is_empty() {
            None
        } else {
            Some(evaluate(&forest, &x_holdout, &y_holdout)?)
        };
        let cross_validation = self.cross_validate(&x_train, &y_train)?;

        let mut feature_importances: Vec<FeatureImportance> = self
            .config
            .schema
            .features()
            .iter()
            .zip(forest.feature_importances())
            .map(|(feature, &importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect();
        feature_importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        let report = TrainingReport {
            train_rows: x_train.len(),
            holdout_rows: x_holdout.len(),
            positive_rate: y.iter().filter(|&&v| v).count() as f64 / y.len() as f64,
            train_accuracy,
            holdout,
            cross_validation,
            feature_importances,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            schema = %self.config.schema.kind(),
            train_rows = report.train_rows,
            holdout_rows = report.holdout_rows,
            train_accuracy = report.train_accuracy,
            holdout_accuracy = ?report.holdout_accuracy(),
            duration_ms = report.duration_ms,
            "Training completed"
        );

        Ok(ModelArtifact::new(
            self.config.schema.clone(),
            self.config.params.clone(),
            forest,
            Some(report),
        ))
    }

    /// Train and persist the artifact to `path`
    pub fn train_to(&self, rows: &[TrainingRow], path: impl AsRef<Path>) -> Result<LoadedModel> {
        let artifact = self.train(rows)?;
        artifact.save(path)
    }

    fn cross_validate(&self, x: &[Vec<f64>], y: &[bool]) -> Result<Option<CrossValidation>> {
        let folds = self.config.cv_folds;
        if folds < 2 || x.len() < folds {
            return Ok(None);
        }

        let mut scores = Vec::with_capacity(folds);
        for fold in 0..folds {
            let start = fold * x.len() / folds;
            let end = (fold + 1) * x.len() / folds;
            let train_idx: Vec<usize> = (0..x.len()).filter(|i| *i < start || *i >= end).collect();
            let test_idx: Vec<usize> = (start..end).collect();

            let (x_fit, y_fit) = gather(x, y, &train_idx);
            let (x_val, y_val) = gather(x, y, &test_idx);
            let forest = RandomForest::fit(&x_fit, &y_fit, &self.config.params)?;
            scores.push(accuracy(&forest, &x_val, &y_val)?);
        }

        let (mean, std) = mean_std(&scores);
        Ok(Some(CrossValidation {
            folds,
            scores,
            mean,
            std,
        }))
    }
}

fn gather(x: &[Vec<f64>], y: &[bool], indices: &[usize]) -> (Vec<Vec<f64>>, Vec<bool>) {
    indices.iter().map(|&i| (x[i].clone(), y[i])).unzip()
}

fn predict_labels(forest: &RandomForest, x: &[Vec<f64>]) -> Result<(Vec<f64>, Vec<bool>)> {
    let scores = x
        .iter()
        .map(|row| forest.predict_proba(row))
        .collect::<Result<Vec<f64>>>()?;
    let labels = scores.iter().map(|&p| p > crate::predictor::DECISION_THRESHOLD).collect();
    Ok((scores, labels))
}

fn accuracy(forest: &RandomForest, x: &[Vec<f64>], y: &[bool]) -> Result<f64> {
    let (_, predicted) = predict_labels(forest, x)?;
    Ok(ConfusionMatrix::from_predictions(&predicted, y).accuracy())
}

fn evaluate(forest: &RandomForest, x: &[Vec<f64>], y: &[bool]) -> Result<HoldoutMetrics> {
    let (scores, predicted) = predict_labels(forest, x)?;
    let confusion = ConfusionMatrix::from_predictions(&predicted, y);
    Ok(HoldoutMetrics {
        accuracy: confusion.accuracy(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        f1: confusion.f1(),
        roc_auc: roc_auc(&scores, y),
        confusion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_rows() -> Vec<TrainingRow> {
        (0..40)
            .map(|i| {
                let hired = i % 2 == 0;
                let skills = if hired { 6.0 + (i % 4) as f64 } else { 1.0 + (i % 3) as f64 };
                let budget = 500.0 + (i * 37 % 900) as f64;
                let experience = if hired { 3.0 + (i % 5) as f64 } else { (i % 2) as f64 };
                TrainingRow::from_pairs(
                    [("skills", skills), ("budget", budget), ("experience", experience)],
                    hired,
                )
            })
            .collect()
    }

    fn fast_config() -> TrainingConfig {
        let mut config = TrainingConfig::legacy();
        config.params = config.params.with_trees(20);
        config
    }

    #[test]
    fn test_insufficient_data() {
        let trainer = Trainer::new(fast_config());
        let err = trainer.train(&[]).unwrap_err();
        assert!(matches!(err, HiringError::InsufficientData { rows: 0, min: 2 }));

        let one = &legacy_rows()[..1];
        let err = trainer.train(one).unwrap_err();
        assert!(matches!(err, HiringError::InsufficientData { rows: 1, .. }));
    }

    #[test]
    fn test_two_rows_is_enough() {
        let rows = &legacy_rows()[..2];
        let artifact = Trainer::new(fast_config()).train(rows).unwrap();
        let report = artifact.report.unwrap();
        assert_eq!(report.train_rows + report.holdout_rows, 2);
        assert!(report.train_rows >= 1);
    }

    #[test]
    fn test_training_report() {
        let artifact = Trainer::new(fast_config()).train(&legacy_rows()).unwrap();
        let report = artifact.report.as_ref().unwrap();
        assert_eq!(report.holdout_rows, 12);
        assert_eq!(report.train_rows, 28);
        assert!((report.positive_rate - 0.5).abs() < 1e-12);
        assert!(report.train_accuracy > 0.9);

        let holdout = report.holdout.as_ref().unwrap();
        assert!(holdout.accuracy > 0.8);
        assert_eq!(holdout.confusion.total(), 12);

        assert_eq!(report.feature_importances.len(), 3);
        assert!(report.feature_importances[0].importance >= report.feature_importances[1].importance);
        assert_eq!(report.top_features(10).len(), 3);
    }

    #[test]
    fn test_training_is_deterministic() {
        let trainer = Trainer::new(fast_config());
        let a = trainer.train(&legacy_rows()).unwrap();
        let b = trainer.train(&legacy_rows()).unwrap();
        assert_eq!(a.forest, b.forest);
    }

    #[test]
    fn test_cross_validation() {
        let mut config = fast_config();
        config.cv_folds = 4;
        let artifact = Trainer::new(config).train(&legacy_rows()).unwrap();
        let cv = artifact.report.unwrap().cross_validation.unwrap();
        assert_eq!(cv.folds, 4);
        assert_eq!(cv.scores.len(), 4);
        assert!((0.0..=1.0).contains(&cv.mean));
    }

    #[test]
    fn test_smart_hiring_on_sample_data() {
        let rows = generate_sample_rows(120, 42);
        let mut config = TrainingConfig::smart_hiring();
        config.params = config.params.with_trees(30);
        let artifact = Trainer::new(config).train(&rows).unwrap();
        assert_eq!(artifact.schema, FeatureSchema::smart_hiring());
        assert_eq!(artifact.forest.n_features(), 16);
        let report = artifact.report.unwrap();
        assert_eq!(report.holdout_rows, 24);
    }
}
