//! Typed errors for training, artifacts, and prediction.
//!
//! Parse failures never appear here: they are recovered by excluding the
//! row and counting it in a [`CleaningReport`].

use std::path::PathBuf;
use thiserror::Error;

use crate::dataset::CleaningReport;

/// A category value that has no code in the fitted mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unmapped category: {value:?}")]
pub struct UnmappedCategory {
    pub value: String,
}

/// Errors reading or writing persisted artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact file does not exist
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    /// Reading or writing the file failed
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failed
    #[error("artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Decoded but internally inconsistent
    #[error("corrupt artifact: {reason}")]
    Corrupt { reason: String },

    /// Feature layout or transmission codes differ from this build's
    #[error("artifact schema mismatch: {reason}")]
    SchemaMismatch { reason: String },
}

/// Errors that abort a training run.
#[derive(Debug, Error)]
pub enum TrainError {
    /// No row survived cleaning
    #[error("dataset is empty after cleaning ({report})")]
    EmptyDataset { report: CleaningReport },

    /// Too few rows to hold out an evaluation split
    #[error("need at least {needed} clean rows to train and evaluate, got {got}")]
    InsufficientRows { needed: usize, got: usize },

    /// Normal equations could not be solved
    #[error("regression system is singular")]
    SingularSystem,

    /// Invalid training parameter
    #[error("invalid training config: {reason}")]
    Config { reason: String },

    /// Raw dataset could not be read
    #[error("dataset error: {0}")]
    Dataset(#[from] listing_collector::CollectError),

    /// Artifacts could not be written
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Reasons a single prediction request cannot be answered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    #[error("location mapping unavailable: {reason}")]
    MappingUnavailable { reason: String },

    #[error("unknown location: {name}")]
    UnknownLocation { name: String },

    #[error("default location code {code} is not in the mapping")]
    InvalidDefaultLocation { code: u32 },

    #[error("mileage must be a finite non-negative number, got {value}")]
    InvalidMileage { value: f64 },

    #[error("model produced a non-positive price: {value}")]
    NonPositivePrediction { value: f64 },
}

impl From<UnmappedCategory> for PredictionError {
    fn from(err: UnmappedCategory) -> Self {
        PredictionError::UnknownLocation { name: err.value }
    }
}

/// Result type alias for training operations.
pub type TrainResult<T> = std::result::Result<T, TrainError>;

/// Result type alias for artifact operations.
pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;
