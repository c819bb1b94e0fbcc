//! Binary Logistic Regression
//!
//! Class order is fixed by [`HealthClass::ALL`]: index 0 is Good, index 1 is
//! Issue. The model scores `p(Issue) = sigmoid(w . x + b)`.

use crate::scaler::ScaledVector;
use crate::InferenceError;
use feature_engine::HealthClass;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Probability assigned to each class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "Good")]
    pub good: f64,
    #[serde(rename = "Issue")]
    pub issue: f64,
}

impl ClassProbabilities {
    /// Probability of a given class
    pub fn get(&self, class: HealthClass) -> f64 {
        match class {
            HealthClass::Good => self.good,
            HealthClass::Issue => self.issue,
        }
    }

    /// Probabilities in class index order
    pub fn as_array(&self) -> [f64; 2] {
        [self.good, self.issue]
    }
}

/// Output of a single classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassPrediction {
    /// Hard label
    pub label: HealthClass,
    /// Per-class probabilities
    pub probabilities: ClassProbabilities,
    /// Raw decision value `w . x + b`
    pub decision: f64,
}

impl ClassPrediction {
    /// Probability mass on the predicted label
    pub fn confidence(&self) -> f64 {
        self.probabilities.get(self.label)
    }
}

/// Solver settings for [`LogisticRegression::fit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// Inverse regularization strength
    pub c: f64,
    /// Newton iteration cap
    pub max_iter: usize,
    /// Convergence threshold on the gradient, relative to total sample weight
    pub tolerance: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-8,
        }
    }
}

/// Outcome of a fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSummary {
    pub iterations: usize,
    pub converged: bool,
    pub objective: f64,
}

/// Fitted linear binary classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    /// Build a model from known coefficients
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Fit by damped Newton iterations on the L2-regularized, sample-weighted
    /// log loss `0.5 |w|^2 + C * sum_i s_i * logloss_i`. The intercept is not
    /// penalized.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[HealthClass],
        sample_weight: ArrayView1<'_, f64>,
        params: &SolverParams,
    ) -> Result<(Self, SolverSummary), InferenceError> {
        let (n, d) = x.dim();
        if n == 0 || y.len() != n || sample_weight.len() != n {
            return Err(InferenceError::Training(format!(
                "inconsistent training shapes: {} rows, {} labels, {} weights",
                n,
                y.len(),
                sample_weight.len()
            )));
        }
        if params.c <= 0.0 {
            return Err(InferenceError::Training(format!(
                "regularization C must be positive, got {}",
                params.c
            )));
        }

        let target: Array1<f64> = y
            .iter()
            .map(|c| if *c == HealthClass::Issue { 1.0 } else { 0.0 })
            .collect();
        let lambda = 1.0 / params.c;
        let threshold = params.tolerance * sample_weight.sum().max(1.0);

        let mut w = Array1::<f64>::zeros(d);
        let mut b = 0.0;
        let mut loss = objective(x, &target, sample_weight, &w, b, lambda);
        let mut summary = SolverSummary {
            iterations: 0,
            converged: false,
            objective: loss,
        };

        for iteration in 1..=params.max_iter {
            summary.iterations = iteration;

            let p = (x.dot(&w) + b).mapv(sigmoid);
            let weighted_residual = &(&p - &target) * &sample_weight;
            let grad_w = x.t().dot(&weighted_residual) + &w * lambda;
            let grad_b = weighted_residual.sum();

            let grad_max = grad_w.iter().fold(grad_b.abs(), |m, g| m.max(g.abs()));
            if grad_max <= threshold {
                summary.converged = true;
                break;
            }

            let curvature = &sample_weight * &p.mapv(|pi| pi * (1.0 - pi));
            let xr = &x * &curvature.view().insert_axis(Axis(1));
            let cross = xr.sum_axis(Axis(0));

            let mut hessian = Array2::<f64>::zeros((d + 1, d + 1));
            hessian.slice_mut(s![..d, ..d]).assign(&xr.t().dot(&x));
            for j in 0..d {
                hessian[[j, j]] += lambda;
            }
            hessian.slice_mut(s![..d, d]).assign(&cross);
            hessian.slice_mut(s![d, ..d]).assign(&cross);
            hessian[[d, d]] = curvature.sum() + 1e-10;

            let mut gradient = Array1::<f64>::zeros(d + 1);
            gradient.slice_mut(s![..d]).assign(&grad_w);
            gradient[d] = grad_b;

            let step = solve(hessian, gradient)
                .ok_or_else(|| InferenceError::Training("singular Hessian".to_string()))?;
            let step_w = step.slice(s![..d]);

            let mut alpha = 1.0;
            loop {
                let w_next = &w - &(&step_w * alpha);
                let b_next = b - alpha * step[d];
                let next_loss = objective(x, &target, sample_weight, &w_next, b_next, lambda);
                if next_loss <= loss || alpha < 1e-10 {
                    w = w_next;
                    b = b_next;
                    loss = next_loss;
                    break;
                }
                alpha *= 0.5;
            }
            debug!(iteration, loss, step = alpha, "Newton step");
        }

        summary.objective = loss;
        if !summary.converged {
            warn!(
                "Logistic regression did not converge within {} iterations",
                params.max_iter
            );
        }

        Ok((
            Self {
                weights: w.to_vec(),
                intercept: b,
            },
            summary,
        ))
    }

    /// Raw score `w . x + b`
    pub fn decision_function(&self, values: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(values)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    /// Classify a standardized vector
    pub fn predict(&self, scaled: &ScaledVector) -> Result<ClassPrediction, InferenceError> {
        if scaled.len() != self.n_features() {
            return Err(InferenceError::SchemaMismatch {
                component: "classifier",
                expected: self.n_features(),
                actual: scaled.len(),
            });
        }

        let decision = self.decision_function(scaled.values());
        let issue = sigmoid(decision);
        let label = if decision > 0.0 {
            HealthClass::Issue
        } else {
            HealthClass::Good
        };

        Ok(ClassPrediction {
            label,
            probabilities: ClassProbabilities {
                good: 1.0 - issue,
                issue,
            },
            decision,
        })
    }

    /// Number of input features
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Coefficients
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Intercept
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

fn objective(
    x: ArrayView2<'_, f64>,
    target: &Array1<f64>,
    sample_weight: ArrayView1<'_, f64>,
    w: &Array1<f64>,
    b: f64,
    lambda: f64,
) -> f64 {
    let z = x.dot(w) + b;
    let data: f64 = z
        .iter()
        .zip(target)
        .zip(sample_weight)
        .map(|((&z, &t), &s)| s * (softplus(z) - t * z))
        .sum();
    data + 0.5 * lambda * w.dot(w)
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for k in 0..n {
        let pivot = (k..n).max_by(|&i, &j| a[[i, k]].abs().total_cmp(&a[[j, k]].abs()))?;
        if a[[pivot, k]].abs() < f64::MIN_POSITIVE {
            return None;
        }
        if pivot != k {
            for j in 0..n {
                a.swap([k, j], [pivot, j]);
            }
            b.swap(k, pivot);
        }
        for i in (k + 1)..n {
            let factor = a[[i, k]] / a[[k, k]];
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                let delta = factor * a[[k, j]];
                a[[i, j]] -= delta;
            }
            let delta = factor * b[k];
            b[i] -= delta;
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| a[[i, j]] * x[j]).sum();
        x[i] = (b[i] - tail) / a[[i, i]];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    fn scaled(values: Vec<f64>) -> ScaledVector {
        crate::StandardScaler::from_parts(
            (0..values.len()).map(|i| format!("f{i}")).collect(),
            vec![0.0; values.len()],
            vec![1.0; values.len()],
        )
        .unwrap()
        .transform(&feature_engine::FeatureVector::from_values(values))
        .unwrap()
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
    }

    #[test]
    fn test_label_probability_correspondence() {
        let model = LogisticRegression::new(vec![2.0, -1.0], 0.5);

        let issue = model.predict(&scaled(vec![1.0, 0.0])).unwrap();
        assert_eq!(issue.label, HealthClass::Issue);
        assert!(issue.probabilities.issue > 0.5);
        assert_eq!(issue.confidence(), issue.probabilities.issue);

        let good = model.predict(&scaled(vec![-1.0, 1.0])).unwrap();
        assert_eq!(good.label, HealthClass::Good);
        assert!(good.probabilities.good > 0.5);
        assert_eq!(good.confidence(), good.probabilities.good);
        assert_eq!(good.probabilities.as_array()[HealthClass::Good.index()], good.probabilities.good);
    }

    #[test]
    fn test_zero_decision_is_good() {
        let model = LogisticRegression::new(vec![1.0], 0.0);
        let out = model.predict(&scaled(vec![0.0])).unwrap();
        assert_eq!(out.label, HealthClass::Good);
        assert_eq!(out.confidence(), 0.5);
    }

    #[test]
    fn test_predict_length_mismatch() {
        let model = LogisticRegression::new(vec![1.0, 1.0], 0.0);
        assert!(matches!(
            model.predict(&scaled(vec![1.0])),
            Err(InferenceError::SchemaMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_fit_separates_classes() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [
            HealthClass::Good,
            HealthClass::Good,
            HealthClass::Good,
            HealthClass::Issue,
            HealthClass::Issue,
            HealthClass::Issue,
        ];
        let weights = Array1::<f64>::ones(6);
        let (model, summary) =
            LogisticRegression::fit(x.view(), &y, weights.view(), &SolverParams::default()).unwrap();

        assert!(summary.converged);
        assert!(model.weights()[0] > 0.0);
        assert!(model.intercept().abs() < 1e-6);
        assert_eq!(model.predict(&scaled(vec![1.2])).unwrap().label, HealthClass::Issue);
        assert_eq!(model.predict(&scaled(vec![-1.2])).unwrap().label, HealthClass::Good);
    }

    #[test]
    fn test_sample_weight_shifts_intercept() {
        let x = array![[0.0], [0.0], [0.0], [0.0]];
        let y = [HealthClass::Good, HealthClass::Good, HealthClass::Good, HealthClass::Issue];
        let params = SolverParams::default();

        let (plain, _) = LogisticRegression::fit(x.view(), &y, Array1::<f64>::ones(4).view(), &params).unwrap();
        let balanced = array![2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0, 2.0];
        let (weighted, _) = LogisticRegression::fit(x.view(), &y, balanced.view(), &params).unwrap();

        // Unweighted intercept is log(1/3); balancing brings it to zero.
        assert!((plain.intercept() - (1.0f64 / 3.0).ln()).abs() < 1e-6);
        assert!(weighted.intercept().abs() < 1e-6);
    }

    #[test]
    fn test_solve() {
        let a = array![[0.0, 2.0], [3.0, 1.0]];
        let b = array![4.0, 5.0];
        let x = solve(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_probabilities_sum_to_one(
            w in prop::collection::vec(-5.0f64..5.0, 4),
            x in prop::collection::vec(-10.0f64..10.0, 4),
            b in -3.0f64..3.0,
        ) {
            let model = LogisticRegression::new(w, b);
            let out = model.predict(&scaled(x)).unwrap();
            let total = out.probabilities.good + out.probabilities.issue;
            prop_assert!((total - 1.0).abs() < 1e-6);
            prop_assert_eq!(out.confidence(), out.probabilities.get(out.label));
            prop_assert!(out.confidence() >= 0.5);
        }
    }
}
