//! Feature Schema
//!
//! The ordered list of columns the scaler and classifier were fitted
//! against. Numeric dataset columns come first, in file order, followed by
//! one-hot columns `Column_Value` for each categorical column in
//! [`CATEGORICAL_COLUMNS`] order with values sorted.

use crate::dataset::{TrainingDataset, CATEGORICAL_COLUMNS};
use crate::features::FeatureVector;
use std::collections::HashMap;
use tracing::info;

/// Ordered, immutable list of feature names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema from explicit names
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    /// Derive the schema from training data
    pub fn from_dataset(dataset: &TrainingDataset) -> Self {
        let mut names: Vec<String> = dataset.numeric_columns().to_vec();
        let numeric = names.len();

        for (i, column) in CATEGORICAL_COLUMNS.iter().enumerate() {
            names.extend(
                dataset
                    .distinct_values(i)
                    .into_iter()
                    .map(|value| Self::one_hot_key(column, value)),
            );
        }

        info!(
            "Built feature schema: {} features ({} numeric, {} one-hot)",
            names.len(),
            numeric,
            names.len() - numeric
        );
        Self::new(names)
    }

    /// One-hot column name for a categorical value
    pub fn one_hot_key(column: &str, value: &str) -> String {
        format!("{column}_{value}")
    }

    /// Feature names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema has no features
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a feature
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Whether a feature exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Encode every dataset row into a feature vector
    pub fn encode_dataset(&self, dataset: &TrainingDataset) -> Vec<FeatureVector> {
        let numeric_slots: Vec<Option<usize>> = dataset
            .numeric_columns()
            .iter()
            .map(|c| self.index_of(c))
            .collect();

        dataset
            .rows()
            .map(|row| {
                let mut vector = FeatureVector::zeros(self.len());
                for (slot, &value) in numeric_slots.iter().zip(row.numeric) {
                    if let Some(slot) = *slot {
                        vector.set(slot, value);
                    }
                }
                for (column, cell) in CATEGORICAL_COLUMNS.iter().zip(row.categorical) {
                    let slot = cell
                        .as_deref()
                        .and_then(|value| self.index_of(&Self::one_hot_key(column, value)));
                    if let Some(slot) = slot {
                        vector.set(slot, 1.0);
                    }
                }
                vector
            })
            .collect()
    }
}
