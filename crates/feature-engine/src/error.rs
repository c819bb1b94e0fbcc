//! Feature Engine Error Types

use thiserror::Error;

/// Errors caused by a malformed prediction request.
///
/// These are user-correctable and map to a client error at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Required field absent or null
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Numeric field that does not parse as the declared type
    #[error("Invalid value for {field}: {value:?} is not a valid {expected}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Field holding a JSON value of the wrong shape
    #[error("Invalid type for {field}: expected {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    /// Request body is not a JSON object
    #[error("Request body must be a JSON object")]
    NotAnObject,
}

/// Errors while reading the training dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset is missing required column {0}")]
    MissingColumn(&'static str),

    #[error("Row {row}: column {column} has non-numeric value {value:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: unknown Health_Issues label {value:?}")]
    UnknownLabel { row: usize, value: String },

    #[error("Dataset contains no rows")]
    Empty,
}

/// Skew between the declared request fields and a built schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Feature schema has no column {0} for a declared numeric field")]
    MissingColumn(&'static str),

    #[error("Feature schema is empty")]
    Empty,
}
