//! CLI subcommands

pub mod local;
pub mod remote;
pub mod sample;
pub mod train;

use crate::output::{format_optional_ratio, format_ratio};
use hiring_lib::{MatchInsight, RawFeatures, TrainingReport};
use tabled::Tabled;

/// Row for key/value tables
#[derive(Tabled)]
pub(crate) struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl MetricRow {
    pub(crate) fn new(metric: &str, value: impl Into<String>) -> Self {
        Self {
            metric: metric.to_string(),
            value: value.into(),
        }
    }
}

/// Row for the feature importance table
#[derive(Tabled)]
pub(crate) struct FeatureRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Importance")]
    importance: String,
}

pub(crate) fn report_rows(report: &TrainingReport) -> Vec<MetricRow> {
    let mut rows = vec![
        MetricRow::new("Train rows", report.train_rows.to_string()),
        MetricRow::new("Holdout rows", report.holdout_rows.to_string()),
        MetricRow::new("Positive rate", format_ratio(report.positive_rate)),
        MetricRow::new("Train accuracy", format_ratio(report.train_accuracy)),
        MetricRow::new("Holdout accuracy", format_optional_ratio(report.holdout_accuracy())),
    ];
    if let Some(holdout) = &report.holdout {
        let c = &holdout.confusion;
        rows.push(MetricRow::new("Precision", format_ratio(holdout.precision)));
        rows.push(MetricRow::new("Recall", format_ratio(holdout.recall)));
        rows.push(MetricRow::new("F1", format!("{:.3}", holdout.f1)));
        rows.push(MetricRow::new(
            "ROC AUC",
            holdout
                .roc_auc
                .map(|auc| format!("{:.3}", auc))
                .unwrap_or_else(|| "-".to_string()),
        ));
        rows.push(MetricRow::new(
            "Confusion (TP/FP/TN/FN)",
            format!(
                "{}/{}/{}/{}",
                c.true_positive, c.false_positive, c.true_negative, c.false_negative
            ),
        ));
    }
    if let Some(cv) = &report.cross_validation {
        rows.push(MetricRow::new(
            &format!("CV accuracy ({} folds)", cv.folds),
            format!("{} ± {}", format_ratio(cv.mean), format_ratio(cv.std)),
        ));
    }
    rows.push(MetricRow::new("Duration", format!("{} ms", report.duration_ms)));
    rows
}

pub(crate) fn feature_rows(report: &TrainingReport, top: usize) -> Vec<FeatureRow> {
    report
        .top_features(top)
        .iter()
        .map(|f| FeatureRow {
            feature: f.feature.clone(),
            importance: format!("{:.4}", f.importance),
        })
        .collect()
}

/// Raw features from `name=value` pairs; values are coerced by the predictor
pub(crate) fn raw_features(pairs: Vec<(String, String)>) -> RawFeatures {
    pairs
        .into_iter()
        .map(|(name, value)| (name, serde_json::Value::String(value)))
        .collect()
}

pub(crate) fn print_insight(insight: &MatchInsight) {
    println!("\nConfidence: {:.0}%", insight.confidence * 100.0);
    println!("Reasoning:  {}", insight.reasoning);
    if !insight.key_strengths.is_empty() {
        println!("Strengths:  {}", insight.key_strengths.join("; "));
    }
    if !insight.potential_concerns.is_empty() {
        println!("Concerns:   {}", insight.potential_concerns.join("; "));
    }
}
