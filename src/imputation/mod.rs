//! Multivariate imputation over a numeric matrix
//!
//! Operates on an `Array2<f64>` where missing cells are NaN. The cleaning
//! stage extracts the continuous-column subset of a frame into this form,
//! runs the imputer, and writes predictions back into the missing cells
//! only.

mod iterative;

pub use iterative::{Estimator, IterativeImputer};

use crate::error::Result;
use ndarray::Array2;

/// Trait for matrix imputers
pub trait Imputer {
    /// Fit the imputer on data with missing values
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Transform data by imputing missing values
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Check if value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}
