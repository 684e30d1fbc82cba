//! Error types for the preprocessing engine

use thiserror::Error;

/// Result type alias for preprocessing operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// Main error type for tabular preprocessing
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Row-dropping would discard too much of the dataset. Expected and
    /// recoverable: callers switch to a different `NanPolicy`.
    #[error(
        "Dropping rows with missing values would keep {kept} of {total} rows, \
         below the minimum viable fraction {min_fraction}"
    )]
    ExcessiveRowLoss {
        kept: usize,
        total: usize,
        min_fraction: f64,
    },

    /// The levels of a declared-categorical column cannot be enumerated
    /// automatically. Recoverable by adding the column to the ordinal
    /// override set.
    #[error(
        "Cannot automatically determine the cardinality of column '{column}'; \
         add it to the ordinal overrides to encode it anyway"
    )]
    CardinalityUndeterminable { column: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl From<polars::error::PolarsError> for PrepError {
    fn from(err: polars::error::PolarsError) -> Self {
        PrepError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PrepError {
    fn from(err: ndarray::ShapeError) -> Self {
        PrepError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrepError::ColumnNotFound("age".to_string());
        assert_eq!(err.to_string(), "Column not found: age");
    }

    #[test]
    fn test_cardinality_error_names_column() {
        let err = PrepError::CardinalityUndeterminable {
            column: "free_text".to_string(),
        };
        assert!(err.to_string().contains("free_text"));
        assert!(err.to_string().contains("cardinality"));
    }

    #[test]
    fn test_row_loss_error_reports_counts() {
        let err = PrepError::ExcessiveRowLoss {
            kept: 10,
            total: 100,
            min_fraction: 0.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("100"));
    }
}
