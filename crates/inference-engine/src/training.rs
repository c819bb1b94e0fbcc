//! Model Training
//!
//! Deterministic fallback training used when no persisted artifacts exist:
//! stratified hold-out split, scaler fit on the training part, class-balanced
//! logistic regression, and hold-out accuracy.

use crate::classifier::{LogisticRegression, SolverParams, SolverSummary};
use crate::scaler::StandardScaler;
use crate::InferenceError;
use feature_engine::{FeatureSchema, FeatureVector, HealthClass, TrainingDataset};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seed for the train/validation shuffle
    pub seed: u64,
    /// Share of each class held out for validation
    pub test_fraction: f64,
    /// Inverse regularization strength
    pub regularization: f64,
    /// Solver iteration cap
    pub max_iter: usize,
    /// Solver gradient tolerance
    pub tolerance: f64,
    /// Weight samples inversely to class frequency
    pub class_balanced: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 136,
            test_fraction: 0.2,
            regularization: 1.0,
            max_iter: 1000,
            tolerance: 1e-8,
            class_balanced: true,
        }
    }
}

/// Row indices of a train/validation split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices per class, holding out `round(test_fraction * n_class)`
/// rows of each class while keeping at least one for training.
pub fn stratified_split(labels: &[HealthClass], test_fraction: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut split = Split {
        train: Vec::new(),
        test: Vec::new(),
    };

    for class in HealthClass::ALL {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);

        let n_test = ((indices.len() as f64 * fraction).round() as usize)
            .min(indices.len().saturating_sub(1));
        split.test.extend_from_slice(&indices[..n_test]);
        split.train.extend_from_slice(&indices[n_test..]);
    }

    split.train.sort_unstable();
    split.test.sort_unstable();
    split
}

/// Per-class weights `n / (2 * n_class)`, indexed by [`HealthClass::index`]
pub fn balanced_class_weights(labels: &[HealthClass]) -> [f64; 2] {
    let mut counts = [0usize; 2];
    for label in labels {
        counts[label.index()] += 1;
    }
    let n = labels.len() as f64;
    counts.map(|c| if c == 0 { 0.0 } else { n / (2.0 * c as f64) })
}

/// Output of a training run
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub scaler: StandardScaler,
    pub classifier: LogisticRegression,
    /// Accuracy on the held-out rows, if any were held out
    pub validation_accuracy: Option<f64>,
    pub solver: SolverSummary,
}

/// Fit scaler and classifier on `dataset` encoded with `schema`
pub fn train(
    schema: &FeatureSchema,
    dataset: &TrainingDataset,
    config: &TrainingConfig,
) -> Result<TrainedModel, InferenceError> {
    if !(0.0..1.0).contains(&config.test_fraction) {
        return Err(InferenceError::Training(format!(
            "test_fraction must be in [0, 1), got {}",
            config.test_fraction
        )));
    }
    let counts = dataset.class_counts();
    if counts.iter().any(|&c| c == 0) {
        return Err(InferenceError::Training(format!(
            "dataset needs both classes, found Good={} Issue={}",
            counts[0], counts[1]
        )));
    }

    info!(
        "Training logistic regression on {} rows ({} Good, {} Issue)",
        dataset.len(),
        counts[0],
        counts[1]
    );

    let rows = schema.encode_dataset(dataset);
    let labels = dataset.labels();
    let split = stratified_split(labels, config.test_fraction, config.seed);

    let train_rows: Vec<&FeatureVector> = split.train.iter().map(|&i| &rows[i]).collect();
    let scaler = StandardScaler::fit(schema.names().to_vec(), &train_rows)?;

    let width = schema.len();
    let flat: Vec<f64> = train_rows
        .iter()
        .flat_map(|row| scaler.transform_values(row.values()))
        .collect();
    let x = Array2::from_shape_vec((train_rows.len(), width), flat)
        .map_err(|e| InferenceError::Training(e.to_string()))?;

    let y: Vec<HealthClass> = split.train.iter().map(|&i| labels[i]).collect();
    let class_weight = if config.class_balanced {
        balanced_class_weights(&y)
    } else {
        [1.0, 1.0]
    };
    let sample_weight: Array1<f64> = y.iter().map(|c| class_weight[c.index()]).collect();

    let params = SolverParams {
        c: config.regularization,
        max_iter: config.max_iter,
        tolerance: config.tolerance,
    };
    let (classifier, solver) = LogisticRegression::fit(x.view(), &y, sample_weight.view(), &params)?;

    let validation_accuracy = if split.test.is_empty() {
        None
    } else {
        let mut correct = 0usize;
        for &i in &split.test {
            let scaled = scaler.transform(&rows[i])?;
            if classifier.predict(&scaled)?.label == labels[i] {
                correct += 1;
            }
        }
        Some(correct as f64 / split.test.len() as f64)
    };

    match validation_accuracy {
        Some(acc) => info!(
            "Model trained in {} iterations, validation accuracy {:.2}%",
            solver.iterations,
            acc * 100.0
        ),
        None => info!("Model trained in {} iterations, no validation rows", solver.iterations),
    }

    Ok(TrainedModel {
        scaler,
        classifier,
        validation_accuracy,
        solver,
    })
}
