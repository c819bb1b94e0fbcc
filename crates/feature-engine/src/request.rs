//! Raw Prediction Request
//!
//! A prediction request arrives as an arbitrary JSON object. The field tables
//! below declare which keys are read, which schema column they feed, and how
//! numeric values are parsed.

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Parse rule for a numeric request field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// Any finite number
    Float,
    /// Integer; fractional JSON numbers are truncated toward zero
    Int,
}

impl NumericKind {
    fn describe(self) -> &'static str {
        match self {
            NumericKind::Float => "number",
            NumericKind::Int => "integer",
        }
    }
}

/// Numeric request field and the schema column it populates
#[derive(Debug, Clone, Copy)]
pub struct NumericField {
    pub key: &'static str,
    pub column: &'static str,
    pub kind: NumericKind,
}

/// Categorical request field and the column prefix of its one-hot group
#[derive(Debug, Clone, Copy)]
pub struct CategoricalField {
    pub key: &'static str,
    pub column: &'static str,
}

/// Numeric fields copied into the feature vector
pub const NUMERIC_FIELDS: [NumericField; 9] = [
    NumericField { key: "age", column: "Age", kind: NumericKind::Float },
    NumericField { key: "bmi", column: "BMI", kind: NumericKind::Float },
    NumericField { key: "coffee_intake", column: "Coffee_Intake", kind: NumericKind::Float },
    NumericField { key: "caffeine_mg", column: "Caffeine_mg", kind: NumericKind::Float },
    NumericField { key: "sleep_hours", column: "Sleep_Hours", kind: NumericKind::Float },
    NumericField { key: "heart_rate", column: "Heart_Rate", kind: NumericKind::Int },
    NumericField { key: "physical_activity", column: "Physical_Activity_Hours", kind: NumericKind::Float },
    NumericField { key: "smoking", column: "Smoking", kind: NumericKind::Int },
    NumericField { key: "alcohol_consumption", column: "Alcohol_Consumption", kind: NumericKind::Int },
];

/// Categorical fields encoded one-hot
pub const CATEGORICAL_FIELDS: [CategoricalField; 5] = [
    CategoricalField { key: "gender", column: "Gender" },
    CategoricalField { key: "country", column: "Country" },
    CategoricalField { key: "occupation", column: "Occupation" },
    CategoricalField { key: "sleep_quality", column: "Sleep_Quality" },
    CategoricalField { key: "stress_level", column: "Stress_Level" },
];

/// User-supplied attributes for one prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRequest(Map<String, Value>);

impl RawRequest {
    /// Accept a JSON value, which must be an object
    pub fn from_json(value: Value) -> Result<Self, InputError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(InputError::NotAnObject),
        }
    }

    /// Whether the request carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Look up a field; `null` counts as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &'static str) -> Result<&Value, InputError> {
        self.get(key).ok_or(InputError::MissingField(key))
    }

    /// Parse a field according to its numeric kind
    pub fn number(&self, key: &'static str, kind: NumericKind) -> Result<f64, InputError> {
        let value = self.required(key)?;
        let invalid = |raw: String| InputError::InvalidNumber {
            field: key,
            value: raw,
            expected: kind.describe(),
        };

        let parsed = match (value, kind) {
            (Value::Number(n), NumericKind::Float) => n.as_f64(),
            (Value::Number(n), NumericKind::Int) => match n.as_i64() {
                Some(i) => Some(i as f64),
                None => n.as_f64().filter(|f| f.abs() < i64::MAX as f64).map(f64::trunc),
            },
            (Value::String(s), NumericKind::Float) => s.trim().parse::<f64>().ok(),
            (Value::String(s), NumericKind::Int) => s.trim().parse::<i64>().ok().map(|i| i as f64),
            _ => {
                return Err(InputError::InvalidType {
                    field: key,
                    expected: kind.describe(),
                })
            }
        };

        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(value_text(value).into_owned()))
    }

    /// Read a categorical field as text
    pub fn category(&self, key: &'static str) -> Result<Cow<'_, str>, InputError> {
        match self.required(key)? {
            Value::Array(_) | Value::Object(_) => Err(InputError::InvalidType {
                field: key,
                expected: "string",
            }),
            scalar => Ok(value_text(scalar)),
        }
    }
}

impl From<Map<String, Value>> for RawRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}
