//! Column Statistics Computation

/// Summary statistics for one numeric column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStatistics {
    /// Mean value
    pub mean: f64,
    /// Population standard deviation (ddof = 0)
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Number of observations
    pub count: usize,
}

impl ColumnStatistics {
    /// Compute statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;

        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let m2: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
        let std_dev = (m2 / n).sqrt();

        Self {
            mean,
            std_dev,
            min,
            max,
            count: values.len(),
        }
    }

    /// Compute statistics for every column of a row-major matrix
    pub fn per_column<R: AsRef<[f64]>>(rows: &[R], width: usize) -> Vec<Self> {
        let mut column = Vec::with_capacity(rows.len());
        (0..width)
            .map(|j| {
                column.clear();
                column.extend(rows.iter().map(|r| r.as_ref()[j]));
                Self::compute(&column)
            })
            .collect()
    }

    /// Whether the column carried no variation
    pub fn is_constant(&self) -> bool {
        self.std_dev == 0.0
    }
}
