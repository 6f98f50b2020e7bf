//! Hiring library for freelancer/candidate match prediction
//!
//! This crate provides the core functionality for:
//! - Canonical feature schemas and feature vector construction
//! - Random forest training, evaluation and persistence
//! - Match probability prediction with explanations
//! - Health checks and observability

pub mod artifact;
pub mod error;
pub mod forest;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schema;
pub mod training;

pub use artifact::{LoadedModel, ModelArtifact};
pub use error::{HiringError, Result};
pub use forest::{ForestParams, MaxFeatures, RandomForest};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{HiringMetrics, StructuredLogger};
pub use predictor::{
    FallbackPredictor, FeatureVectorBuilder, HiringPredictor, MatchExplainer, ModelHandle,
};
pub use schema::{FeatureSchema, SchemaKind};
pub use training::{Trainer, TrainingConfig, TrainingReport};
