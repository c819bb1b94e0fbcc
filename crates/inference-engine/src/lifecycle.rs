//! Model Lifecycle
//!
//! [`ModelLifecycle`] is the uninitialized state. [`ModelLifecycle::initialize`]
//! is the only way to obtain a [`ReadyModel`], so request handlers can never
//! observe a partially built model.

use crate::artifacts::{load_artifact, save_artifact, ArtifactPaths};
use crate::classifier::LogisticRegression;
use crate::engine::PredictionService;
use crate::scaler::StandardScaler;
use crate::training::{train, TrainingConfig};
use crate::{ArtifactError, InferenceError};
use feature_engine::{FeatureSchema, TrainingDataset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the lifecycle finds its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleSettings {
    /// Training CSV, required on every startup to rebuild the schema
    pub dataset_path: PathBuf,
    /// Persisted scaler and classifier
    pub artifacts: ArtifactPaths,
    /// Hyperparameters for fallback training
    pub training: TrainingConfig,
}

/// How the ready model's artifacts were obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArtifactOrigin {
    /// Read from persisted blobs
    Loaded,
    /// Fitted at startup and persisted
    Trained { validation_accuracy: Option<f64> },
}

/// Fully initialized model
#[derive(Debug, Clone)]
pub struct ReadyModel {
    pub service: PredictionService,
    pub origin: ArtifactOrigin,
}

/// Uninitialized model
#[derive(Debug, Clone)]
pub struct ModelLifecycle {
    settings: LifecycleSettings,
}

impl ModelLifecycle {
    /// Create the lifecycle without touching the filesystem
    pub fn new(settings: LifecycleSettings) -> Self {
        Self { settings }
    }

    /// Load persisted artifacts, or train and persist new ones
    ///
    /// Existing readable artifacts are never retrained or rewritten. Loaded
    /// artifacts that disagree with the dataset schema are an error.
    pub fn initialize(self) -> Result<ReadyModel, InferenceError> {
        let dataset = TrainingDataset::from_path(&self.settings.dataset_path)?;
        let schema = Arc::new(FeatureSchema::from_dataset(&dataset));

        match self.load() {
            Ok((scaler, classifier)) => {
                info!(
                    "Loaded persisted model from {} and {}",
                    self.settings.artifacts.scaler.display(),
                    self.settings.artifacts.model.display()
                );
                let service = PredictionService::new(schema, scaler, classifier)?;
                return Ok(ReadyModel {
                    service,
                    origin: ArtifactOrigin::Loaded,
                });
            }
            Err(ArtifactError::Missing(path)) => {
                info!("No persisted artifact at {}, training a new model", path);
            }
            Err(e) => {
                warn!("Persisted artifacts unusable ({}), retraining", e);
            }
        }

        let trained = train(&schema, &dataset, &self.settings.training)?;
        let service = PredictionService::new(schema, trained.scaler, trained.classifier)?;
        save_artifact(service.scaler(), &self.settings.artifacts.scaler)?;
        save_artifact(service.classifier(), &self.settings.artifacts.model)?;

        Ok(ReadyModel {
            service,
            origin: ArtifactOrigin::Trained {
                validation_accuracy: trained.validation_accuracy,
            },
        })
    }

    fn load(&self) -> Result<(StandardScaler, LogisticRegression), ArtifactError> {
        let scaler = load_artifact(&self.settings.artifacts.scaler)?;
        let classifier = load_artifact(&self.settings.artifacts.model)?;
        Ok((scaler, classifier))
    }
}
