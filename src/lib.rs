//! tabprep - tabular data cleaning and encoding
//!
//! A preprocessing stage for tabular datasets ahead of model training:
//! classify feature columns, resolve missing values in continuous columns
//! under a selectable policy, and convert categorical columns to numeric
//! encodings.
//!
//! # Modules
//!
//! - [`inspection`] - Column classification and per-column statistics
//! - [`cleaning`] - Missing-value policies for continuous columns
//! - [`imputation`] - Multivariate iterative imputation over a matrix
//! - [`encoding`] - Cardinality-driven categorical encoding
//! - [`config`] - Tunable thresholds for all of the above
//!
//! Frames are immutable inputs: every operation returns a new
//! `polars::DataFrame`, and missingness in the target and in declared
//! categorical columns is never overwritten.

pub mod error;

pub mod config;
pub mod inspection;
pub mod cleaning;
pub mod imputation;
pub mod encoding;

pub use error::{PrepError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cleaning::{handle_continuous_nans, NanPolicy};
    pub use crate::config::PrepConfig;
    pub use crate::encoding::{
        encode_categoricals, non_numeric_columns, resolve_strategy, ColumnEncoding,
        EncodingReport, EncodingStrategy,
    };
    pub use crate::error::{PrepError, Result};
    pub use crate::imputation::{Estimator, Imputer, IterativeImputer};
    pub use crate::inspection::{inspect, unique_counts, ColumnKind, ColumnReport, Inspection};
}
