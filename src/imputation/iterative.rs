//! Round-robin iterative imputer
//!
//! Each column with missing cells is regressed on all other columns over
//! the rows where it is observed, and its missing cells are replaced with
//! the predictions. Columns are visited in shuffled order, and the sweep
//! repeats until the total absolute change falls below a tolerance or the
//! iteration cap is reached. This is an approximate procedure: predictions
//! come from per-feature least squares on centered data, optionally with a
//! ridge penalty.

use crate::imputation::{is_missing, Imputer};
use crate::error::Result;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Regression used for each column sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Estimator {
    /// Ordinary least squares, one coefficient per feature
    Linear,
    /// Least squares with an L2 penalty on each coefficient
    Ridge,
}

/// Iterative round-robin imputer for a NaN-marked matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterativeImputer {
    max_iter: usize,
    tol: f64,
    estimator: Estimator,
    ridge_alpha: f64,
    seed: Option<u64>,
    /// Per-column means over observed cells, set by `fit`
    column_means: Option<Vec<f64>>,
}

impl IterativeImputer {
    /// Create a new imputer with the given estimator
    pub fn new(estimator: Estimator) -> Self {
        Self {
            max_iter: 10,
            tol: 1e-3,
            estimator,
            ridge_alpha: 1.0,
            seed: None,
            column_means: None,
        }
    }

    /// Set the iteration cap
    pub fn with_max_iter(mut self, n: usize) -> Self {
        self.max_iter = n.max(1);
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol.max(1e-10);
        self
    }

    /// Set the ridge penalty (only used by `Estimator::Ridge`)
    pub fn with_ridge_alpha(mut self, alpha: f64) -> Self {
        self.ridge_alpha = alpha.max(0.0);
        self
    }

    /// Set the random seed controlling the column visit order
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn observed_mean(column: &[f64]) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &v in column {
            if !is_missing(v) {
                sum += v;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Fit per-feature coefficients on centered data and predict `x_test`.
    fn regress(&self, x_train: &Array2<f64>, y_train: &Array1<f64>, x_test: &Array2<f64>) -> Array1<f64> {
        let n = x_train.nrows();
        let p = x_train.ncols();
        let y_mean = y_train.mean().unwrap_or(0.0);

        if n < 2 || p == 0 {
            return Array1::from_elem(x_test.nrows(), y_mean);
        }

        let penalty = match self.estimator {
            Estimator::Ridge => self.ridge_alpha,
            Estimator::Linear => 0.0,
        };

        let mut coefficients = vec![0.0; p];
        let mut x_means = vec![0.0; p];
        for j in 0..p {
            let x_mean = x_train.column(j).mean().unwrap_or(0.0);
            x_means[j] = x_mean;

            let mut num = 0.0;
            let mut den = penalty;
            for i in 0..n {
                let xc = x_train[[i, j]] - x_mean;
                num += xc * (y_train[i] - y_mean);
                den += xc * xc;
            }
            if den > 1e-10 {
                coefficients[j] = num / den;
            }
        }

        let intercept = y_mean
            - coefficients
                .iter()
                .zip(x_means.iter())
                .map(|(&c, &m)| c * m)
                .sum::<f64>();

        let mut predictions = Array1::from_elem(x_test.nrows(), intercept);
        for i in 0..x_test.nrows() {
            for (j, &coef) in coefficients.iter().enumerate() {
                predictions[i] += coef * x_test[[i, j]];
            }
        }
        predictions
    }

    /// One sweep over all columns; returns the total absolute change.
    fn sweep(&self, data: &mut Array2<f64>, missing: &[Vec<usize>], rng: &mut StdRng) -> f64 {
        let n_features = data.ncols();
        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(rng);

        let mut total_change = 0.0;

        for &target_col in &order {
            let missing_rows = &missing[target_col];
            if missing_rows.is_empty() {
                continue;
            }

            let observed_rows: Vec<usize> = {
                let mut all: Vec<bool> = vec![true; data.nrows()];
                for &i in missing_rows {
                    all[i] = false;
                }
                all.iter()
                    .enumerate()
                    .filter(|(_, &keep)| keep)
                    .map(|(i, _)| i)
                    .collect()
            };
            if observed_rows.is_empty() {
                continue;
            }

            let feature_cols: Vec<usize> =
                (0..n_features).filter(|&c| c != target_col).collect();

            let mut x_train = Array2::zeros((observed_rows.len(), feature_cols.len()));
            let mut y_train = Array1::zeros(observed_rows.len());
            for (i, &row) in observed_rows.iter().enumerate() {
                for (j, &col) in feature_cols.iter().enumerate() {
                    x_train[[i, j]] = data[[row, col]];
                }
                y_train[i] = data[[row, target_col]];
            }

            let mut x_test = Array2::zeros((missing_rows.len(), feature_cols.len()));
            for (i, &row) in missing_rows.iter().enumerate() {
                for (j, &col) in feature_cols.iter().enumerate() {
                    x_test[[i, j]] = data[[row, col]];
                }
            }

            let predictions = self.regress(&x_train, &y_train, &x_test);

            for (i, &row) in missing_rows.iter().enumerate() {
                let old = data[[row, target_col]];
                let new = predictions[i];
                data[[row, target_col]] = new;
                total_change += (new - old).abs();
            }
        }

        total_change
    }
}

impl Default for IterativeImputer {
    fn default() -> Self {
        Self::new(Estimator::Linear)
    }
}

impl Imputer for IterativeImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let means = (0..x.ncols())
            .map(|j| {
                let column: Vec<f64> = x.column(j).iter().copied().collect();
                Self::observed_mean(&column)
            })
            .collect();
        self.column_means = Some(means);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let means = self.column_means.as_ref().ok_or_else(|| {
            crate::error::PrepError::ComputationError("imputer not fitted".to_string())
        })?;

        let mut result = x.clone();

        // Record missing positions, then seed them with the column means
        let mut missing: Vec<Vec<usize>> = vec![Vec::new(); x.ncols()];
        for j in 0..x.ncols() {
            for i in 0..x.nrows() {
                if is_missing(result[[i, j]]) {
                    missing[j].push(i);
                    result[[i, j]] = means[j];
                }
            }
        }

        if missing.iter().all(|rows| rows.is_empty()) {
            return Ok(result);
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        for _ in 0..self.max_iter {
            let change = self.sweep(&mut result, &missing, &mut rng);
            if change < self.tol {
                break;
            }
        }

        Ok(result)
    }
}
