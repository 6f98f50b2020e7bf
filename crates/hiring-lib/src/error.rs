//! Error taxonomy for training, persistence and prediction

use thiserror::Error;

/// Errors surfaced by the hiring library
#[derive(Debug, Error)]
pub enum HiringError {
    /// A recognized input value could not be coerced to a finite number,
    /// or a required field was missing
    #[error("invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// No trained model artifact has been loaded
    #[error("no trained model is loaded")]
    ModelUnavailable,

    /// Training was requested with too few labeled rows
    #[error("insufficient training data: {rows} rows supplied, at least {min} required")]
    InsufficientData { rows: usize, min: usize },

    /// Malformed training data
    #[error("dataset error at line {line}: {message}")]
    Dataset { line: usize, message: String },

    /// Corrupt, truncated or otherwise unreadable model artifact
    #[error("model artifact error: {0}")]
    Artifact(String),

    /// Feature vector does not match the schema the model was fit on
    #[error("feature schema mismatch: expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HiringError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind, used in HTTP error bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            HiringError::InvalidInput { .. } => "invalid_input",
            HiringError::ModelUnavailable => "model_unavailable",
            HiringError::InsufficientData { .. } => "insufficient_data",
            HiringError::Dataset { .. } => "dataset",
            HiringError::Artifact(_) => "artifact",
            HiringError::SchemaMismatch { .. } => "schema_mismatch",
            HiringError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, HiringError>;
