//! Commands against a running hiring server

use anyhow::{Context, Result};
use hiring_lib::Candidate;
use std::path::Path;
use tabled::Tabled;

use super::{print_insight, raw_features, MetricRow};
use crate::client::ApiClient;
use crate::output::{
    color_probability, color_status, format_label, print_json, print_success, print_table,
    print_warning, OutputFormat,
};

pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            let rows = vec![
                MetricRow::new("Status", color_status(&health.status)),
                MetricRow::new("Model loaded", health.model_loaded.to_string()),
                MetricRow::new(
                    "Model version",
                    health.model_version.clone().unwrap_or_else(|| "-".to_string()),
                ),
            ];
            print_table(rows, "No health data");
            if !health.model_loaded {
                print_warning("Server has no trained model; predictions will fail or use fallback scores");
            }
        }
    }
    Ok(())
}

pub async fn predict(
    client: &ApiClient,
    features: Vec<(String, String)>,
    format: OutputFormat,
) -> Result<()> {
    let response = client.predict(raw_features(features)).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            println!(
                "{} ({} probability, model {})",
                format_label(response.label),
                color_probability(response.prediction),
                response.model_version
            );
            println!("{}", response.message);
            if let Some(insight) = &response.insight {
                print_insight(insight);
            }
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Candidate")]
    id: String,
    #[tabled(rename = "Match")]
    score: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Reasoning")]
    reasoning: String,
}

pub async fn rank(client: &ApiClient, candidates: &Path, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(candidates)
        .with_context(|| format!("Failed to read {}", candidates.display()))?;
    let pool: Vec<Candidate> =
        serde_json::from_str(&content).context("Failed to parse candidate list")?;

    let response = client.rank(pool).await?;
    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            let rows = response
                .candidates
                .iter()
                .enumerate()
                .map(|(i, c)| RankRow {
                    position: i + 1,
                    id: c.id.clone(),
                    score: color_probability(c.match_score),
                    confidence: c
                        .insight
                        .as_ref()
                        .map(|insight| format!("{:.0}%", insight.confidence * 100.0))
                        .unwrap_or_else(|| "-".to_string()),
                    reasoning: c
                        .insight
                        .as_ref()
                        .map(|insight| insight.reasoning.clone())
                        .unwrap_or_default(),
                })
                .collect();
            print_table(rows, "No candidates");
            println!("Model {}", response.model_version);
        }
    }
    Ok(())
}

pub async fn reload(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response = client.reload().await?;
    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_success(&format!("Server reloaded model {}", response.model_version))
        }
    }
    Ok(())
}
