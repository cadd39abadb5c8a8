//! Ridge-regularized binary logistic regression.
//!
//! Each word classifier is a logistic regression that models
//!
//! ```text
//! P(target | x) = sigmoid(b₀ + Σ βⱼ·xⱼ)
//! ```
//!
//! # Fitting
//!
//! [`LogisticRegression::fit`] maximizes the weighted, penalized log-likelihood
//!
//! ```text
//! Σᵢ wᵢ·[yᵢ·log pᵢ + (1 - yᵢ)·log(1 - pᵢ)] - ridge·Σⱼ βⱼ²
//! ```
//!
//! with Newton-Raphson iterations (iteratively reweighted least squares). Each Newton system
//! is solved by a Cholesky factorization, and a step-halving line search guarantees the
//! objective never increases.
//!
//! The columns are standardized internally with weighted means and standard deviations, so
//! the penalty treats all attributes alike regardless of their scale. Constant columns carry
//! no information and are pinned to a zero coefficient. The intercept is not penalized. The
//! returned [`LogisticClassifier`] stores un-standardized coefficients, so it can be applied
//! to raw feature vectors directly.

use serde::{Deserialize, Serialize};

use crate::feature::FeatureVector;

const DEFAULT_MAX_ITERATIONS: usize = 100;
const STEP_TOLERANCE: f64 = 1e-8;
const OBJECTIVE_TOLERANCE: f64 = 1e-12;
const MIN_STEP_SCALE: f64 = 1e-10;
const CONSTANT_COLUMN_SD: f64 = 1e-10;

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display, derive_more::Error,
)]
pub enum FitError {
    #[display("no training examples")]
    Empty,
    #[display("total instance weight is zero")]
    ZeroWeight,
    #[display("negative instance weight")]
    NegativeWeight,
    #[display("all weighted examples belong to one class")]
    SingleClass,
    #[display("non-finite feature value or instance weight")]
    NonFinite,
    #[display("feature vector has {found} columns, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[display("Hessian is not positive definite")]
    NotPositiveDefinite,
    #[display("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[display("fitted classifier cannot score the training referents: {_0}")]
    Power(PredictionError),
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display, derive_more::Error,
)]
pub enum PredictionError {
    #[display("feature vector has {found} columns, classifier expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[display("prediction is not a finite probability")]
    NonFinite,
}

/// One weighted training instance.
#[derive(Debug, Clone, Copy)]
pub struct Example<'a> {
    pub features: &'a FeatureVector,
    pub target: bool,
    pub weight: f64,
}

/// Fitting configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticRegression {
    pub ridge: f64,
    pub max_iterations: usize,
}

impl LogisticRegression {
    #[must_use]
    pub fn new(ridge: f64) -> Self {
        Self {
            ridge,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn fit(&self, examples: &[Example<'_>]) -> Result<LogisticClassifier, FitError> {
        let data = Standardized::new(examples)?;
        let dim = data.columns + 1;
        let ridge = self.ridge;

        let mut theta = vec![0.0; dim];
        theta[0] = data.prior_logit();
        let mut objective = data.objective(&theta, ridge);

        for _ in 0..self.max_iterations {
            let (gradient, hessian) = data.gradient_hessian(&theta, ridge);
            let direction =
                cholesky_solve(hessian, dim, &gradient).ok_or(FitError::NotPositiveDefinite)?;

            let mut scale = 1.0;
            let (candidate, candidate_objective) = loop {
                let candidate = theta
                    .iter()
                    .zip(&direction)
                    .map(|(t, d)| t - scale * d)
                    .collect::<Vec<_>>();
                let candidate_objective = data.objective(&candidate, ridge);
                if candidate_objective <= objective || scale < MIN_STEP_SCALE {
                    break (candidate, candidate_objective);
                }
                scale /= 2.0;
            };
            if !candidate_objective.is_finite() {
                return Err(FitError::NonFinite);
            }

            let step = direction
                .iter()
                .map(|d| (scale * d).abs())
                .fold(0.0, f64::max);
            let improvement = objective - candidate_objective;
            theta = candidate;
            objective = candidate_objective;

            if step < STEP_TOLERANCE
                || improvement.abs() <= OBJECTIVE_TOLERANCE * (1.0 + objective.abs())
                || scale < MIN_STEP_SCALE
            {
                return Ok(data.unstandardize(&theta));
            }
        }

        Err(FitError::NoConvergence {
            iterations: self.max_iterations,
        })
    }
}

/// A fitted classifier with coefficients on the raw feature scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticClassifier {
    /// Probability that a referent with these features is the target.
    pub fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.coefficients.len() {
            return Err(PredictionError::DimensionMismatch {
                expected: self.coefficients.len(),
                found: features.len(),
            });
        }
        let logit = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        let probability = sigmoid(logit);
        if probability.is_finite() {
            Ok(probability)
        } else {
            Err(PredictionError::NonFinite)
        }
    }
}

/// Training data with standardized columns.
#[derive(Debug)]
struct Standardized {
    columns: usize,
    rows: Vec<Vec<f64>>,
    targets: Vec<f64>,
    weights: Vec<f64>,
    means: Vec<f64>,
    sds: Vec<f64>,
    constant: Vec<bool>,
}

impl Standardized {
    fn new(examples: &[Example<'_>]) -> Result<Self, FitError> {
        let first = examples.first().ok_or(FitError::Empty)?;
        let columns = first.features.as_slice().len();

        let mut total_weight = 0.0;
        let mut positive_weight = 0.0;
        for example in examples {
            let features = example.features.as_slice();
            if features.len() != columns {
                return Err(FitError::DimensionMismatch {
                    expected: columns,
                    found: features.len(),
                });
            }
            if !example.weight.is_finite() || features.iter().any(|x| !x.is_finite()) {
                return Err(FitError::NonFinite);
            }
            if example.weight < 0.0 {
                return Err(FitError::NegativeWeight);
            }
            total_weight += example.weight;
            if example.target {
                positive_weight += example.weight;
            }
        }
        if total_weight <= 0.0 {
            return Err(FitError::ZeroWeight);
        }
        if positive_weight <= 0.0 || positive_weight >= total_weight {
            return Err(FitError::SingleClass);
        }

        let mut means = vec![0.0; columns];
        for example in examples {
            for (mean, x) in means.iter_mut().zip(example.features.as_slice()) {
                *mean += example.weight * x;
            }
        }
        for mean in &mut means {
            *mean /= total_weight;
        }

        let mut sds = vec![0.0; columns];
        for example in examples {
            for ((sd, mean), x) in sds.iter_mut().zip(&means).zip(example.features.as_slice()) {
                *sd += example.weight * (x - mean).powi(2);
            }
        }
        let mut constant = vec![false; columns];
        for (sd, is_constant) in sds.iter_mut().zip(&mut constant) {
            *sd = (*sd / total_weight).sqrt();
            if *sd < CONSTANT_COLUMN_SD {
                *sd = 1.0;
                *is_constant = true;
            }
        }

        let rows = examples
            .iter()
            .map(|example| {
                example
                    .features
                    .as_slice()
                    .iter()
                    .zip(means.iter().zip(&sds).zip(&constant))
                    .map(|(x, ((mean, sd), is_constant))| {
                        if *is_constant { 0.0 } else { (x - mean) / sd }
                    })
                    .collect()
            })
            .collect();
        let targets = examples
            .iter()
            .map(|e| if e.target { 1.0 } else { 0.0 })
            .collect();
        let weights = examples.iter().map(|e| e.weight).collect();

        Ok(Self {
            columns,
            rows,
            targets,
            weights,
            means,
            sds,
            constant,
        })
    }

    fn prior_logit(&self) -> f64 {
        let total = self.weights.iter().sum::<f64>();
        let positive = self
            .weights
            .iter()
            .zip(&self.targets)
            .map(|(w, y)| w * y)
            .sum::<f64>();
        (positive / (total - positive)).ln()
    }

    fn logit(theta: &[f64], row: &[f64]) -> f64 {
        theta[0] + theta[1..].iter().zip(row).map(|(b, z)| b * z).sum::<f64>()
    }

    /// Negative penalized log-likelihood.
    fn objective(&self, theta: &[f64], ridge: f64) -> f64 {
        let loss = self
            .rows
            .iter()
            .zip(&self.targets)
            .zip(&self.weights)
            .map(|((row, y), w)| {
                let t = Self::logit(theta, row);
                w * (softplus(t) - y * t)
            })
            .sum::<f64>();
        let penalty = theta[1..].iter().map(|b| b * b).sum::<f64>();
        loss + ridge * penalty
    }

    fn gradient_hessian(&self, theta: &[f64], ridge: f64) -> (Vec<f64>, Vec<f64>) {
        let dim = self.columns + 1;
        let mut gradient = vec![0.0; dim];
        let mut hessian = vec![0.0; dim * dim];
        let mut augmented = vec![0.0; dim];
        augmented[0] = 1.0;

        for ((row, y), w) in self.rows.iter().zip(&self.targets).zip(&self.weights) {
            let p = sigmoid(Self::logit(theta, row));
            augmented[1..].copy_from_slice(row);
            let residual = w * (p - y);
            let curvature = w * p * (1.0 - p);
            for (i, zi) in augmented.iter().enumerate() {
                gradient[i] += residual * zi;
                for (j, zj) in augmented.iter().enumerate().take(i + 1) {
                    hessian[i * dim + j] += curvature * zi * zj;
                }
            }
        }
        for i in 0..dim {
            for j in 0..i {
                hessian[j * dim + i] = hessian[i * dim + j];
            }
        }

        for (j, is_constant) in self.constant.iter().enumerate() {
            let k = j + 1;
            if *is_constant {
                gradient[k] = 0.0;
                for m in 0..dim {
                    hessian[k * dim + m] = 0.0;
                    hessian[m * dim + k] = 0.0;
                }
                hessian[k * dim + k] = 1.0;
            } else {
                gradient[k] += 2.0 * ridge * theta[k];
                hessian[k * dim + k] += 2.0 * ridge;
            }
        }
        (gradient, hessian)
    }

    fn unstandardize(&self, theta: &[f64]) -> LogisticClassifier {
        let coefficients = theta[1..]
            .iter()
            .zip(&self.sds)
            .zip(&self.constant)
            .map(|((b, sd), is_constant)| if *is_constant { 0.0 } else { b / sd })
            .collect::<Vec<_>>();
        let intercept = theta[0]
            - coefficients
                .iter()
                .zip(&self.means)
                .map(|(c, m)| c * m)
                .sum::<f64>();
        LogisticClassifier {
            intercept,
            coefficients,
        }
    }
}

fn sigmoid(t: f64) -> f64 {
    if t >= 0.0 {
        1.0 / (1.0 + (-t).exp())
    } else {
        let e = t.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + eᵗ)` without overflow.
fn softplus(t: f64) -> f64 {
    t.max(0.0) + (-t.abs()).exp().ln_1p()
}

/// Solves `a · x = b` for a symmetric positive definite `a` (row-major, `n × n`).
///
/// Returns `None` when the matrix is not positive definite.
fn cholesky_solve(mut a: Vec<f64>, n: usize, b: &[f64]) -> Option<Vec<f64>> {
    for j in 0..n {
        let diagonal = a[j * n + j] - (0..j).map(|k| a[j * n + k].powi(2)).sum::<f64>();
        if !(diagonal > 0.0 && diagonal.is_finite()) {
            return None;
        }
        let pivot = diagonal.sqrt();
        a[j * n + j] = pivot;
        for i in (j + 1)..n {
            let dot = (0..j).map(|k| a[i * n + k] * a[j * n + k]).sum::<f64>();
            a[i * n + j] = (a[i * n + j] - dot) / pivot;
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let dot = (0..i).map(|k| a[i * n + k] * y[k]).sum::<f64>();
        y[i] = (b[i] - dot) / a[i * n + i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let dot = ((i + 1)..n).map(|k| a[k * n + i] * x[k]).sum::<f64>();
        x[i] = (y[i] - dot) / a[i * n + i];
    }
    Some(x)
}
