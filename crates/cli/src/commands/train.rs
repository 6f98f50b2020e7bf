//! Model training command

use anyhow::{Context, Result};
use hiring_lib::{
    forest::DEFAULT_SEED, training, LoadedModel, SchemaKind, Trainer, TrainingConfig,
};
use serde_json::json;
use std::path::PathBuf;

use super::{feature_rows, report_rows};
use crate::output::{print_info, print_json, print_success, print_table, OutputFormat};

pub struct TrainOptions {
    pub data: PathBuf,
    pub schema: SchemaKind,
    pub label: Option<String>,
    pub output: PathBuf,
    pub trees: Option<usize>,
    pub seed: Option<u64>,
    pub cv_folds: usize,
    pub pad_samples: Option<usize>,
}

impl TrainOptions {
    fn training_config(&self) -> TrainingConfig {
        let mut config = TrainingConfig::for_schema(self.schema);
        if let Some(trees) = self.trees {
            config.params = config.params.with_trees(trees);
        }
        if let Some(seed) = self.seed {
            config.params = config.params.with_seed(seed);
            config.split_seed = seed;
        }
        config.cv_folds = self.cv_folds;
        config
    }
}

/// Load, optionally pad, train and persist
pub fn train_model(options: &TrainOptions) -> Result<LoadedModel> {
    let schema = options.schema.schema();
    let label = options
        .label
        .clone()
        .unwrap_or_else(|| schema.label_column().to_string());

    let mut rows = training::load_csv_with_label(&options.data, &schema, &label)
        .with_context(|| format!("Failed to load training data from {}", options.data.display()))?;

    if let Some(count) = options.pad_samples {
        anyhow::ensure!(
            options.schema == SchemaKind::SmartHiring,
            "synthetic padding is only available for the smart-hiring schema"
        );
        let real = rows.len();
        rows = training::pad_with_samples(rows, count, options.seed.unwrap_or(DEFAULT_SEED));
        if rows.len() > real {
            print_info(&format!(
                "Only {} labeled rows; added {} synthetic rows",
                real,
                rows.len() - real
            ));
        }
    }

    Trainer::new(options.training_config())
        .train_to(&rows, &options.output)
        .context("Training failed")
}

pub async fn run(options: TrainOptions, format: OutputFormat) -> Result<()> {
    let model = tokio::task::spawn_blocking(move || {
        let model = train_model(&options)?;
        Ok::<_, anyhow::Error>(model)
    })
    .await
    .context("Training task failed")??;

    let report = model.artifact.report.as_ref();
    match format {
        OutputFormat::Json => print_json(&json!({
            "model_version": model.version,
            "path": model.path,
            "schema": model.schema().kind(),
            "report": report,
        }))?,
        OutputFormat::Table => {
            print_success(&format!(
                "Model {} saved to {}",
                model.version,
                model
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ));
            if let Some(report) = report {
                print_table(report_rows(report), "No training metrics");
                println!("\nTop features:");
                print_table(feature_rows(report, 5), "No feature importances");
            }
        }
    }

    Ok(())
}
