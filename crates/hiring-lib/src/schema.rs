//! Canonical feature schemas
//!
//! A schema is the single ordered list of feature names shared by the
//! training and prediction paths. The schema a model was fit with is stored
//! in its artifact, so prediction always builds vectors in training order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Features of the smart hiring match model, in canonical order
pub const SMART_HIRING_FEATURES: [&str; 16] = [
    "skill_match_score",
    "avg_rating",
    "recommendation_rate",
    "completion_rate",
    "bid_success_rate",
    "category_experience",
    "response_time_hours",
    "portfolio_quality",
    "budget_match_score",
    "delivery_time_days",
    "freelancer_tenure_days",
    "project_complexity",
    "client_history_score",
    "past_collaboration",
    "skills_count_match",
    "workload_factor",
];

/// Label column of the smart hiring training export
pub const SMART_HIRING_LABEL: &str = "is_successful_match";

/// Features of the candidate form model, in canonical order
pub const LEGACY_FEATURES: [&str; 3] = ["skills", "budget", "experience"];

/// Label column of the candidates table
pub const LEGACY_LABEL: &str = "hire";

/// Known schema families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    SmartHiring,
    Legacy,
}

impl SchemaKind {
    pub fn schema(self) -> FeatureSchema {
        match self {
            SchemaKind::SmartHiring => FeatureSchema::smart_hiring(),
            SchemaKind::Legacy => FeatureSchema::legacy(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::SmartHiring => "smart_hiring",
            SchemaKind::Legacy => "legacy",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "smart_hiring" => Ok(SchemaKind::SmartHiring),
            "legacy" => Ok(SchemaKind::Legacy),
            other => Err(format!("unknown feature schema '{}'", other)),
        }
    }
}

/// Ordered feature names plus the label column they are trained against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    kind: SchemaKind,
    features: Vec<String>,
    label_column: String,
}

impl FeatureSchema {
    pub fn smart_hiring() -> Self {
        Self {
            kind: SchemaKind::SmartHiring,
            features: SMART_HIRING_FEATURES.iter().map(|s| s.to_string()).collect(),
            label_column: SMART_HIRING_LABEL.to_string(),
        }
    }

    pub fn legacy() -> Self {
        Self {
            kind: SchemaKind::Legacy,
            features: LEGACY_FEATURES.iter().map(|s| s.to_string()).collect(),
            label_column: LEGACY_LABEL.to_string(),
        }
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::smart_hiring()
    }
}
