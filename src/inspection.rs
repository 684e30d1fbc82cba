//! Column inspection
//!
//! Classifies every non-target, non-declared-categorical column as either
//! continuous or ambiguous, and records the per-column statistics (distinct
//! and missing counts) the cleaning and encoding stages decide on.

use crate::config::PrepConfig;
use crate::error::{PrepError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inferred treatment for a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Numeric storage with enough distinct values to be a real measurement
    Continuous,
    /// Numeric storage but low cardinality: possibly an unflagged categorical
    AmbiguousNumeric,
    /// Non-numeric storage not declared categorical
    AmbiguousString,
}

/// Statistics and classification for a single column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    /// Distinct non-missing values
    pub unique_count: usize,
    pub null_count: usize,
    pub kind: ColumnKind,
}

/// Result of inspecting a frame: one report per candidate column,
/// in frame column order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inspection {
    reports: Vec<ColumnReport>,
}

impl Inspection {
    /// Report for a single column, if it was a candidate
    pub fn get(&self, name: &str) -> Option<&ColumnReport> {
        self.reports.iter().find(|r| r.name == name)
    }

    /// All per-column reports in frame order
    pub fn reports(&self) -> &[ColumnReport] {
        &self.reports
    }

    /// Names of columns classified as continuous
    pub fn continuous_columns(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| r.kind == ColumnKind::Continuous)
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Names of columns the inspector could not classify as continuous
    pub fn ambiguous_columns(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| r.kind != ColumnKind::Continuous)
            .map(|r| r.name.as_str())
            .collect()
    }
}

/// Check if dtype is numeric
pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Count distinct non-null values of a series. Polars counts null as its
/// own group, so it gets subtracted back out when present.
pub(crate) fn distinct_non_null(series: &Series) -> Result<usize> {
    let n = series.n_unique()?;
    if series.null_count() > 0 {
        Ok(n.saturating_sub(1))
    } else {
        Ok(n)
    }
}

/// Fail fast when the target or a listed column does not exist, or the
/// target is itself listed. Shared entry validation for all components.
pub(crate) fn validate_columns(
    df: &DataFrame,
    target: &str,
    listed: &[&str],
    list_role: &str,
) -> Result<()> {
    if df.column(target).is_err() {
        return Err(PrepError::ColumnNotFound(target.to_string()));
    }
    for name in listed {
        if *name == target {
            return Err(PrepError::ConfigError(format!(
                "target column '{target}' cannot also be listed as {list_role}"
            )));
        }
        if df.column(name).is_err() {
            return Err(PrepError::ColumnNotFound((*name).to_string()));
        }
    }
    Ok(())
}

/// Inspect every non-target, non-declared-categorical column of `df`.
///
/// Pure and read-only. Ambiguity is recorded in the result, never raised;
/// the only failures are configuration errors (unknown column names,
/// target listed as categorical).
pub fn inspect(
    df: &DataFrame,
    target: &str,
    categoricals: &[&str],
    config: &PrepConfig,
) -> Result<Inspection> {
    validate_columns(df, target, categoricals, "categorical")?;

    let mut reports = Vec::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == target || categoricals.contains(&name) {
            continue;
        }

        let series = column.as_materialized_series();
        let unique_count = distinct_non_null(series)?;
        let null_count = series.null_count();

        let kind = if is_numeric_dtype(series.dtype()) {
            if unique_count > config.min_continuous_unique {
                ColumnKind::Continuous
            } else {
                ColumnKind::AmbiguousNumeric
            }
        } else {
            ColumnKind::AmbiguousString
        };

        reports.push(ColumnReport {
            name: name.to_string(),
            unique_count,
            null_count,
            kind,
        });
    }

    Ok(Inspection { reports })
}

/// Distinct non-null counts for every feature column (everything except
/// the target), keyed by column name.
pub fn unique_counts(df: &DataFrame, target: &str) -> Result<HashMap<String, usize>> {
    if df.column(target).is_err() {
        return Err(PrepError::ColumnNotFound(target.to_string()));
    }

    let mut counts = HashMap::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == target {
            continue;
        }
        let n = distinct_non_null(column.as_materialized_series())?;
        counts.insert(name.to_string(), n);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "height".into(),
                &[
                    Some(1.62),
                    Some(1.71),
                    Some(1.80),
                    None,
                    Some(1.55),
                    Some(1.68),
                    Some(1.90),
                ],
            ),
            Column::new("rating".into(), &[1i64, 2, 3, 1, 2, 3, 2]),
            Column::new(
                "city".into(),
                &["lyon", "nice", "lyon", "paris", "nice", "paris", "lyon"],
            ),
            Column::new("target".into(), &[0i64, 1, 0, 1, 0, 1, 0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_classification() {
        let df = sample_df();
        let config = PrepConfig::default().with_min_continuous_unique(3);
        let inspection = inspect(&df, "target", &[], &config).unwrap();

        assert_eq!(inspection.get("height").unwrap().kind, ColumnKind::Continuous);
        assert_eq!(
            inspection.get("rating").unwrap().kind,
            ColumnKind::AmbiguousNumeric
        );
        assert_eq!(
            inspection.get("city").unwrap().kind,
            ColumnKind::AmbiguousString
        );
        assert!(inspection.get("target").is_none());
    }

    #[test]
    fn test_null_and_unique_counts() {
        let df = sample_df();
        let config = PrepConfig::default();
        let inspection = inspect(&df, "target", &[], &config).unwrap();

        let height = inspection.get("height").unwrap();
        assert_eq!(height.null_count, 1);
        assert_eq!(height.unique_count, 6);

        let rating = inspection.get("rating").unwrap();
        assert_eq!(rating.null_count, 0);
        assert_eq!(rating.unique_count, 3);
    }

    #[test]
    fn test_declared_categoricals_skipped() {
        let df = sample_df();
        let config = PrepConfig::default();
        let inspection = inspect(&df, "target", &["city", "rating"], &config).unwrap();

        assert!(inspection.get("city").is_none());
        assert!(inspection.get("rating").is_none());
        assert!(inspection.get("height").is_some());
    }

    #[test]
    fn test_unknown_target_fails() {
        let df = sample_df();
        let config = PrepConfig::default();
        let err = inspect(&df, "label", &[], &config).unwrap_err();
        assert!(matches!(err, PrepError::ColumnNotFound(name) if name == "label"));
    }

    #[test]
    fn test_target_as_categorical_fails() {
        let df = sample_df();
        let config = PrepConfig::default();
        let err = inspect(&df, "target", &["target"], &config).unwrap_err();
        assert!(matches!(err, PrepError::ConfigError(_)));
    }

    #[test]
    fn test_unique_counts_helper() {
        let df = sample_df();
        let counts = unique_counts(&df, "target").unwrap();
        assert_eq!(counts["city"], 3);
        assert_eq!(counts["rating"], 3);
        assert_eq!(counts["height"], 6);
        assert!(!counts.contains_key("target"));
    }
}
