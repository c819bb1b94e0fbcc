//! Training Dataset Loading
//!
//! Reads the coffee/health CSV export and binarizes the `Health_Issues`
//! column into [`HealthClass`] labels.

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Identifier column, never a feature
pub const ID_COLUMN: &str = "ID";

/// Label column
pub const LABEL_COLUMN: &str = "Health_Issues";

/// Columns expanded by one-hot encoding, in schema order
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "Stress_Level",
    "Sleep_Quality",
    "Country",
    "Gender",
    "Occupation",
];

/// Cell contents treated as a missing value
const MISSING_MARKERS: [&str; 10] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "None", "null", "NULL", "<NA>",
];

/// Binary health outcome predicted by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthClass {
    /// No reported health issue
    Good,
    /// Mild, moderate or severe health issue
    Issue,
}

impl HealthClass {
    /// Classes in model output order
    pub const ALL: [HealthClass; 2] = [HealthClass::Good, HealthClass::Issue];

    /// Position of this class in probability vectors
    pub fn index(self) -> usize {
        match self {
            HealthClass::Good => 0,
            HealthClass::Issue => 1,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthClass::Good => "Good",
            HealthClass::Issue => "Issue",
        }
    }

    /// Map a raw `Health_Issues` cell onto a class
    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if is_missing(raw) {
            return Some(HealthClass::Good);
        }
        match raw {
            "Good" => Some(HealthClass::Good),
            "Mild" | "Moderate" | "Severe" | "Issue" => Some(HealthClass::Issue),
            _ => None,
        }
    }
}

impl fmt::Display for HealthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// One row of the dataset, borrowed
#[derive(Debug, Clone, Copy)]
pub struct DatasetRow<'a> {
    /// Numeric cells, aligned with [`TrainingDataset::numeric_columns`]
    pub numeric: &'a [f64],
    /// Categorical cells, aligned with [`CATEGORICAL_COLUMNS`]
    pub categorical: &'a [Option<String>; 5],
    /// Binarized label
    pub label: HealthClass,
}

/// Parsed training data
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    numeric_columns: Vec<String>,
    numeric: Vec<Vec<f64>>,
    categorical: Vec<[Option<String>; 5]>,
    labels: Vec<HealthClass>,
}

impl TrainingDataset {
    /// Load the dataset from a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            "Loaded training dataset {}: {} rows, {} numeric columns",
            path.display(),
            dataset.len(),
            dataset.numeric_columns.len()
        );
        Ok(dataset)
    }

    /// Parse the dataset from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let position = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(DatasetError::MissingColumn(name))
        };

        position(ID_COLUMN)?;
        let label_idx = position(LABEL_COLUMN)?;
        let mut categorical_idx = [0usize; 5];
        for (slot, name) in categorical_idx.iter_mut().zip(CATEGORICAL_COLUMNS) {
            *slot = position(name)?;
        }

        let (numeric_idx, numeric_columns): (Vec<usize>, Vec<String>) = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| *h != ID_COLUMN && *h != LABEL_COLUMN && !CATEGORICAL_COLUMNS.contains(h))
            .map(|(i, h)| (i, h.to_string()))
            .unzip();

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        let mut labels = Vec::new();

        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let row = i + 1;

            let values = numeric_idx
                .iter()
                .zip(&numeric_columns)
                .map(|(&idx, column)| {
                    let cell = record.get(idx).unwrap_or("");
                    cell.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| DatasetError::InvalidNumber {
                            row,
                            column: column.clone(),
                            value: cell.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let cells = categorical_idx.map(|idx| {
                record
                    .get(idx)
                    .filter(|cell| !is_missing(cell))
                    .map(str::to_string)
            });

            let raw_label = record.get(label_idx).unwrap_or("");
            let label = HealthClass::from_label(raw_label).ok_or_else(|| DatasetError::UnknownLabel {
                row,
                value: raw_label.to_string(),
            })?;

            numeric.push(values);
            categorical.push(cells);
            labels.push(label);
        }

        if labels.is_empty() {
            return Err(DatasetError::Empty);
        }

        debug!("Parsed {} dataset rows", labels.len());

        Ok(Self {
            numeric_columns,
            numeric,
            categorical,
            labels,
        })
    }

    /// Numeric column names in file order
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Binarized labels
    pub fn labels(&self) -> &[HealthClass] {
        &self.labels
    }

    /// Borrow a single row
    pub fn row(&self, index: usize) -> DatasetRow<'_> {
        DatasetRow {
            numeric: &self.numeric[index],
            categorical: &self.categorical[index],
            label: self.labels[index],
        }
    }

    /// Iterate over all rows
    pub fn rows(&self) -> impl Iterator<Item = DatasetRow<'_>> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    /// Sorted distinct values observed in a categorical column
    pub fn distinct_values(&self, categorical_index: usize) -> BTreeSet<&str> {
        self.categorical
            .iter()
            .filter_map(|cells| cells[categorical_index].as_deref())
            .collect()
    }

    /// Row count per class, indexed by [`HealthClass::index`]
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }
}
