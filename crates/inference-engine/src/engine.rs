//! Prediction Service

use crate::classifier::{ClassProbabilities, LogisticRegression};
use crate::scaler::StandardScaler;
use crate::InferenceError;
use feature_engine::{FeatureSchema, HealthClass, InputNormalizer, RawRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Result of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class
    pub prediction: HealthClass,
    /// Probability of the predicted class
    pub confidence: f64,
    /// Probability of each class
    pub probabilities: ClassProbabilities,
}

/// Normalizer, scaler and classifier bound to one feature schema
///
/// Immutable once built, so a single instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct PredictionService {
    normalizer: InputNormalizer,
    scaler: StandardScaler,
    classifier: LogisticRegression,
}

impl PredictionService {
    /// Assemble the service, checking that all components agree on the schema
    pub fn new(
        schema: Arc<FeatureSchema>,
        scaler: StandardScaler,
        classifier: LogisticRegression,
    ) -> Result<Self, InferenceError> {
        if scaler.n_features() != schema.len() {
            return Err(InferenceError::SchemaMismatch {
                component: "scaler",
                expected: schema.len(),
                actual: scaler.n_features(),
            });
        }
        if let Some((position, (expected, found))) = schema
            .names()
            .iter()
            .zip(scaler.feature_names())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(InferenceError::FeatureOrder {
                position,
                expected: expected.clone(),
                found: found.clone(),
            });
        }
        if classifier.n_features() != schema.len() {
            return Err(InferenceError::SchemaMismatch {
                component: "classifier",
                expected: schema.len(),
                actual: classifier.n_features(),
            });
        }

        Ok(Self {
            normalizer: InputNormalizer::new(schema)?,
            scaler,
            classifier,
        })
    }

    /// Run normalizer, scaler and classifier on a raw request
    pub fn predict(&self, request: &RawRequest) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();

        let features = self.normalizer.normalize(request)?;
        let scaled = self.scaler.transform(&features)?;
        let output = self.classifier.predict(&scaled)?;

        debug!(
            prediction = %output.label,
            decision = output.decision,
            "Prediction completed in {}us",
            start.elapsed().as_micros()
        );

        Ok(PredictionResult {
            prediction: output.label,
            confidence: output.confidence(),
            probabilities: output.probabilities,
        })
    }

    /// Feature schema
    pub fn schema(&self) -> &FeatureSchema {
        self.normalizer.schema()
    }

    /// Fitted scaler
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Fitted classifier
    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// Whether classifier coefficients are present
    pub fn is_model_loaded(&self) -> bool {
        self.classifier.n_features() > 0
    }

    /// Whether the categorical encoder has a schema to encode against
    pub fn is_encoder_loaded(&self) -> bool {
        !self.schema().is_empty()
    }
}
