//! Health Risk Inference Engine
//!
//! Fitted standardization and logistic regression over the feature schema,
//! the load-or-train model lifecycle, and the prediction service that ties
//! them to raw requests.

mod artifacts;
mod classifier;
mod engine;
mod lifecycle;
mod scaler;
mod training;

pub use artifacts::{load_artifact, save_artifact, Artifact, ArtifactKind, ArtifactPaths};
pub use classifier::{ClassPrediction, ClassProbabilities, LogisticRegression, SolverParams, SolverSummary};
pub use engine::{PredictionResult, PredictionService};
pub use lifecycle::{ArtifactOrigin, LifecycleSettings, ModelLifecycle, ReadyModel};
pub use scaler::{ScaledVector, StandardScaler};
pub use training::{balanced_class_weights, stratified_split, train, Split, TrainedModel, TrainingConfig};

use feature_engine::{DatasetError, InputError, SchemaError};
use thiserror::Error;

/// Errors reading or writing persisted model artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    Missing(String),
    #[error("Failed to access artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode artifact: {0}")]
    Encode(#[source] postcard::Error),
    #[error("Artifact {path} is corrupt: {source}")]
    Decode {
        path: String,
        #[source]
        source: postcard::Error,
    },
    #[error("Artifact {path} has format version {found}, expected {expected}")]
    Version { path: String, found: u32, expected: u32 },
    #[error("Artifact {path} holds invalid values: {reason}")]
    Invalid { path: String, reason: String },
    #[error("Artifact {path} holds a {found:?}, expected a {expected:?}")]
    WrongKind {
        path: String,
        found: ArtifactKind,
        expected: ArtifactKind,
    },
}

/// Errors during model setup or prediction
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Schema mismatch in {component}: expected {expected} features, got {actual}")]
    SchemaMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Feature order mismatch at position {position}: expected {expected}, found {found}")]
    FeatureOrder {
        position: usize,
        expected: String,
        found: String,
    },
    #[error("Training failed: {0}")]
    Training(String),
}

impl InferenceError {
    /// Whether the caller can fix this by correcting the request
    pub fn is_input_error(&self) -> bool {
        matches!(self, InferenceError::Input(_))
    }
}
