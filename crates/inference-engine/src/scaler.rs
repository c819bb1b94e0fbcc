//! Standard Scaler
//!
//! Per-feature affine standardization `(x - mean) / scale` with statistics
//! fixed at fit time. Constant training columns get `scale = 1`, so they map
//! to `x - mean` instead of dividing by zero.

use crate::InferenceError;
use feature_engine::{ColumnStatistics, FeatureVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Standard deviations below this are treated as zero variance
const ZERO_VARIANCE: f64 = 10.0 * f64::EPSILON;

/// Feature vector after standardization
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledVector(Vec<f64>);

impl ScaledVector {
    /// Standardized values
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Vector width
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no slots
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fitted standardization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major training data
    pub fn fit<R: AsRef<[f64]>>(feature_names: Vec<String>, rows: &[R]) -> Result<Self, InferenceError> {
        if rows.is_empty() {
            return Err(InferenceError::Training("cannot fit scaler on zero rows".to_string()));
        }
        let width = feature_names.len();
        if let Some(row) = rows.iter().find(|r| r.as_ref().len() != width) {
            return Err(InferenceError::SchemaMismatch {
                component: "scaler fit",
                expected: width,
                actual: row.as_ref().len(),
            });
        }

        let stats = ColumnStatistics::per_column(rows, width);
        let constant = stats.iter().filter(|s| s.std_dev < ZERO_VARIANCE).count();
        debug!("Fitted scaler on {} rows, {} constant columns", rows.len(), constant);

        Ok(Self {
            feature_names,
            mean: stats.iter().map(|s| s.mean).collect(),
            scale: stats.iter().map(|s| s.std_dev).map(non_zero_scale).collect(),
        })
    }

    /// Assemble a scaler from known coefficients
    pub fn from_parts(
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        for (component, len) in [("scaler mean", mean.len()), ("scaler scale", scale.len())] {
            if len != feature_names.len() {
                return Err(InferenceError::SchemaMismatch {
                    component,
                    expected: feature_names.len(),
                    actual: len,
                });
            }
        }
        Ok(Self {
            feature_names,
            mean,
            scale: scale.into_iter().map(non_zero_scale).collect(),
        })
    }

    /// Standardize a feature vector
    pub fn transform(&self, vector: &FeatureVector) -> Result<ScaledVector, InferenceError> {
        if vector.len() != self.n_features() {
            return Err(InferenceError::SchemaMismatch {
                component: "scaler",
                expected: self.n_features(),
                actual: vector.len(),
            });
        }
        Ok(ScaledVector(self.transform_values(vector.values())))
    }

    pub(crate) fn transform_values(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    /// Names of the columns this scaler was fitted on, in order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of features
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Fitted means
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Fitted scales
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

fn non_zero_scale(std_dev: f64) -> f64 {
    if std_dev < ZERO_VARIANCE {
        1.0
    } else {
        std_dev
    }
}
