//! Feature Vector

use serde::{Deserialize, Serialize};

/// Dense feature vector aligned positionally with a [`FeatureSchema`](crate::FeatureSchema)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Create an all-zero vector of the given width
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    /// Wrap existing values
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Overwrite a slot
    ///
    /// Panics if `index` is out of bounds; slots come from the schema the
    /// vector was sized with.
    pub fn set(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }

    /// Read a slot
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Raw values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Vector width
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no slots
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take ownership of the values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}
