//! Commands that work on a model artifact on local disk

use anyhow::{Context, Result};
use hiring_lib::{HiringPredictor, ModelArtifact, ModelHandle};
use serde_json::json;
use std::path::Path;

use super::{feature_rows, print_insight, raw_features, report_rows, MetricRow};
use crate::output::{
    color_probability, format_bytes, format_label, print_json, print_table, OutputFormat,
};

/// Score one candidate with the artifact at `model`
pub fn predict(model: &Path, features: Vec<(String, String)>, format: OutputFormat) -> Result<()> {
    let handle = ModelHandle::new();
    handle
        .load_from(model)
        .with_context(|| format!("Failed to load model from {}", model.display()))?;
    let predictor = HiringPredictor::new(handle);

    let raw = raw_features(features);
    let result = predictor.predict(&raw)?;
    let insight = predictor.explain(&raw)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "prediction": result.label,
            "probability": result.probability_percent(),
            "score": result.probability,
            "model_version": result.model_version,
            "insight": insight,
        }))?,
        OutputFormat::Table => {
            println!(
                "{} ({} probability, model {})",
                format_label(result.label),
                color_probability(result.probability),
                result.model_version
            );
            if let Some(insight) = &insight {
                print_insight(insight);
            }
        }
    }
    Ok(())
}

/// Print artifact metadata and its stored training report
pub fn inspect(model: &Path, format: OutputFormat) -> Result<()> {
    let loaded = ModelArtifact::load(model)
        .with_context(|| format!("Failed to load model from {}", model.display()))?;
    let artifact = &loaded.artifact;
    let trained_at = chrono::DateTime::from_timestamp(artifact.trained_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| artifact.trained_at.to_string());

    match format {
        OutputFormat::Json => print_json(&json!({
            "model_version": loaded.version,
            "checksum": loaded.checksum,
            "size_bytes": loaded.size_bytes,
            "schema": artifact.schema,
            "params": artifact.params,
            "trained_at": trained_at,
            "report": artifact.report,
        }))?,
        OutputFormat::Table => {
            let params = &artifact.params;
            let rows = vec![
                MetricRow::new("Version", loaded.version.clone()),
                MetricRow::new("Checksum", loaded.checksum.clone()),
                MetricRow::new("Size", format_bytes(loaded.size_bytes as u64)),
                MetricRow::new("Schema", artifact.schema.kind().to_string()),
                MetricRow::new("Features", artifact.schema.len().to_string()),
                MetricRow::new("Trees", artifact.forest.n_trees().to_string()),
                MetricRow::new(
                    "Max depth",
                    params
                        .max_depth
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "unlimited".to_string()),
                ),
                MetricRow::new("Seed", params.seed.to_string()),
                MetricRow::new("Trained", trained_at),
            ];
            print_table(rows, "No metadata");

            if let Some(report) = &artifact.report {
                println!("\nTraining report:");
                print_table(report_rows(report), "No training metrics");
                println!("\nTop features:");
                print_table(feature_rows(report, 10), "No feature importances");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiring_lib::{training, ForestParams, Trainer, TrainingConfig};
    use tempfile::TempDir;

    fn saved_model(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("model.bin");
        let rows = training::generate_sample_rows(60, 42);
        let mut config = TrainingConfig::smart_hiring();
        config.params = ForestParams::smart_hiring().with_trees(5);
        Trainer::new(config).train_to(&rows, &path).unwrap();
        path
    }

    #[test]
    fn test_predict_and_inspect() {
        let dir = TempDir::new().unwrap();
        let path = saved_model(&dir);
        let features = vec![("skill_match_score".to_string(), "0.9".to_string())];
        predict(&path, features, OutputFormat::Json).unwrap();
        inspect(&path, OutputFormat::Table).unwrap();
    }

    #[test]
    fn test_predict_rejects_non_numeric() {
        let dir = TempDir::new().unwrap();
        let path = saved_model(&dir);
        let features = vec![("avg_rating".to_string(), "excellent".to_string())];
        assert!(predict(&path, features, OutputFormat::Table).is_err());
    }

    #[test]
    fn test_missing_model() {
        let dir = TempDir::new().unwrap();
        assert!(inspect(&dir.path().join("absent.bin"), OutputFormat::Table).is_err());
    }
}
