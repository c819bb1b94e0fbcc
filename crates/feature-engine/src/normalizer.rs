//! Input Normalization
//!
//! Turns a sparse [`RawRequest`] into a dense [`FeatureVector`] aligned with
//! the schema the model was trained on.
//!
//! Categorical values that were never seen in training have no schema slot.
//! They are dropped without error, so an unknown category encodes as an
//! all-zero one-hot group.

use crate::error::{InputError, SchemaError};
use crate::features::FeatureVector;
use crate::request::{RawRequest, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::schema::FeatureSchema;
use std::sync::Arc;
use tracing::debug;

/// Encoder from raw requests to schema-aligned feature vectors
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    schema: Arc<FeatureSchema>,
    /// Schema slot for each entry of [`NUMERIC_FIELDS`]
    numeric_slots: Vec<usize>,
}

impl InputNormalizer {
    /// Bind the declared request fields to a schema
    ///
    /// Fails if any declared numeric column is absent, so skew between the
    /// request contract and the training data is caught at startup.
    pub fn new(schema: Arc<FeatureSchema>) -> Result<Self, SchemaError> {
        if schema.is_empty() {
            return Err(SchemaError::Empty);
        }

        let numeric_slots = NUMERIC_FIELDS
            .iter()
            .map(|field| {
                schema
                    .index_of(field.column)
                    .ok_or(SchemaError::MissingColumn(field.column))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            schema,
            numeric_slots,
        })
    }

    /// Schema this normalizer encodes against
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode a request into a feature vector
    pub fn normalize(&self, request: &RawRequest) -> Result<FeatureVector, InputError> {
        let mut vector = FeatureVector::zeros(self.schema.len());

        for (field, &slot) in NUMERIC_FIELDS.iter().zip(&self.numeric_slots) {
            vector.set(slot, request.number(field.key, field.kind)?);
        }

        for field in &CATEGORICAL_FIELDS {
            let value = request.category(field.key)?;
            let key = FeatureSchema::one_hot_key(field.column, &value);
            match self.schema.index_of(&key) {
                Some(slot) => vector.set(slot, 1.0),
                None => debug!(field = field.key, value = %value, "Unseen category left unencoded"),
            }
        }

        Ok(vector)
    }
}
