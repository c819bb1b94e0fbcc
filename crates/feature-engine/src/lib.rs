//! Feature Engineering Engine
//!
//! Loads the training dataset, derives the fixed feature schema, and encodes
//! raw prediction requests into schema-aligned vectors.

mod dataset;
mod error;
mod features;
mod normalizer;
mod request;
mod schema;
mod statistics;

pub use dataset::{
    DatasetRow, HealthClass, TrainingDataset, CATEGORICAL_COLUMNS, ID_COLUMN, LABEL_COLUMN,
};
pub use error::{DatasetError, InputError, SchemaError};
pub use features::FeatureVector;
pub use normalizer::InputNormalizer;
pub use request::{
    CategoricalField, NumericField, NumericKind, RawRequest, CATEGORICAL_FIELDS, NUMERIC_FIELDS,
};
pub use schema::FeatureSchema;
pub use statistics::ColumnStatistics;
