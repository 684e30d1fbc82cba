//! Categorical encoding
//!
//! Converts every declared categorical column into numeric columns. The
//! strategy for each column comes from a pure decision table over its
//! cardinality and the caller's ordinal overrides; a column whose levels
//! cannot be enumerated automatically is a hard, typed failure rather than
//! a guess.

use crate::config::PrepConfig;
use crate::error::{PrepError, Result};
use crate::inspection::{self, is_numeric_dtype, Inspection};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How a single categorical column is converted to numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingStrategy {
    /// Two levels mapped to 0/1
    Binary,
    /// One indicator column per level, all levels kept
    OneHot,
    /// Integer codes in level order
    Ordinal,
    /// Level replaced by its relative frequency among non-null entries
    Frequency,
}

/// Audit metadata for one encoded column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnEncoding {
    pub column: String,
    pub strategy: EncodingStrategy,
    /// Levels in the order used for codes/indicators
    pub levels: Vec<String>,
    /// Numeric column(s) the input column became
    pub output_columns: Vec<String>,
}

/// Per-column strategy metadata returned alongside the encoded frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodingReport {
    entries: Vec<ColumnEncoding>,
}

impl EncodingReport {
    /// Metadata for a single input column
    pub fn get(&self, column: &str) -> Option<&ColumnEncoding> {
        self.entries.iter().find(|e| e.column == column)
    }

    /// All entries, in input-column order
    pub fn entries(&self) -> &[ColumnEncoding] {
        &self.entries
    }
}

/// Pick the encoding strategy for a column from its cardinality.
///
/// Pure decision table: an ordinal override always wins; otherwise
/// `unique_count` of `None` (unenumerable levels) or anything above
/// `config.max_auto_levels` is a `CardinalityUndeterminable` error, never
/// a silent default.
pub fn resolve_strategy(
    column: &str,
    unique_count: Option<usize>,
    is_ordinal: bool,
    config: &PrepConfig,
) -> Result<EncodingStrategy> {
    if is_ordinal {
        return Ok(EncodingStrategy::Ordinal);
    }
    match unique_count {
        Some(n) if n <= 2 => Ok(EncodingStrategy::Binary),
        Some(n) if n <= config.max_onehot_levels => Ok(EncodingStrategy::OneHot),
        Some(n) if n <= config.max_auto_levels => Ok(EncodingStrategy::Frequency),
        _ => Err(PrepError::CardinalityUndeterminable {
            column: column.to_string(),
        }),
    }
}

/// Encode every declared categorical column of `df` to numeric storage.
///
/// Ambiguous columns reported by the inspector but not declared categorical
/// are advisory only and come through unchanged; so does the target.
/// Returns the encoded frame plus per-column strategy metadata.
pub fn encode_categoricals(
    df: &DataFrame,
    target: &str,
    inspected: &Inspection,
    categoricals: &[&str],
    ordinals: &[&str],
    config: &PrepConfig,
) -> Result<(DataFrame, EncodingReport)> {
    inspection::validate_columns(df, target, categoricals, "categorical")?;
    inspection::validate_columns(df, target, ordinals, "ordinal")?;

    for name in inspected.ambiguous_columns() {
        if !categoricals.contains(&name) {
            debug!(column = name, "ambiguous column left unencoded (not declared categorical)");
        }
    }

    let mut out = df.clone();
    let mut entries = Vec::with_capacity(categoricals.len());

    for &name in categoricals {
        let series = df.column(name)?.as_materialized_series();
        let levels = enumerate_levels(series)?;
        let is_ordinal = ordinals.contains(&name);

        // Levels that cannot be enumerated are unencodable even with an
        // override, since there is nothing to rank.
        let Some(levels) = levels else {
            return Err(PrepError::CardinalityUndeterminable {
                column: name.to_string(),
            });
        };
        let strategy = resolve_strategy(name, Some(levels.len()), is_ordinal, config)?;
        debug!(column = name, strategy = ?strategy, n_levels = levels.len(), "encoding column");

        let output_columns = match strategy {
            EncodingStrategy::Binary | EncodingStrategy::Ordinal => {
                apply_integer_codes(&mut out, name, &levels)?;
                vec![name.to_string()]
            }
            EncodingStrategy::Frequency => {
                apply_frequencies(&mut out, name)?;
                vec![name.to_string()]
            }
            EncodingStrategy::OneHot => apply_one_hot(&mut out, name, &levels)?,
        };

        entries.push(ColumnEncoding {
            column: name.to_string(),
            strategy,
            levels,
            output_columns,
        });
    }

    Ok((out, EncodingReport { entries }))
}

/// Names of non-numeric columns other than the target. Encoding must leave
/// this empty; exposed so callers can assert the postcondition.
pub fn non_numeric_columns(df: &DataFrame, target: &str) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.name().as_str() != target && !is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

/// Distinct non-null levels of a column, rendered as strings, in a
/// deterministic order: numeric when every level parses as a number,
/// lexicographic otherwise. `None` when the storage cannot be enumerated
/// (nested or otherwise non-scalar dtypes).
fn enumerate_levels(series: &Series) -> Result<Option<Vec<String>>> {
    let dtype = series.dtype();
    if !is_numeric_dtype(dtype) && !matches!(dtype, DataType::String | DataType::Boolean) {
        return Ok(None);
    }

    let s = series.cast(&DataType::String)?;
    let ca = s.str()?;

    let mut seen = std::collections::HashSet::new();
    let mut levels: Vec<String> = Vec::new();
    for value in ca.into_iter().flatten() {
        if seen.insert(value) {
            levels.push(value.to_string());
        }
    }

    if levels.iter().all(|l| l.parse::<f64>().is_ok()) {
        levels.sort_by(|a, b| {
            let a = a.parse::<f64>().unwrap_or(f64::NAN);
            let b = b.parse::<f64>().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        levels.sort();
    }

    Ok(Some(levels))
}

/// Replace the column with integer codes in level order; nulls stay null.
fn apply_integer_codes(df: &mut DataFrame, name: &str, levels: &[String]) -> Result<()> {
    let codes: HashMap<&str, i32> = levels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i as i32))
        .collect();

    let s = df.column(name)?.as_materialized_series().cast(&DataType::String)?;
    let ca = s.str()?;
    let values: Vec<Option<i32>> = ca
        .into_iter()
        .map(|opt| opt.and_then(|v| codes.get(v).copied()))
        .collect();

    df.with_column(Series::new(name.into(), values))?;
    Ok(())
}

/// Replace the column with each level's relative frequency among non-null
/// entries; nulls stay null.
fn apply_frequencies(df: &mut DataFrame, name: &str) -> Result<()> {
    let s = df.column(name)?.as_materialized_series().cast(&DataType::String)?;
    let ca = s.str()?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;
    for value in ca.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
        total += 1;
    }

    let values: Vec<Option<f64>> = ca
        .into_iter()
        .map(|opt| {
            opt.map(|v| {
                let count = counts.get(v).copied().unwrap_or(0);
                count as f64 / total.max(1) as f64
            })
        })
        .collect();

    df.with_column(Series::new(name.into(), values))?;
    Ok(())
}

/// Expand the column into one `{name}_{level}` indicator per level and drop
/// the original. A null source value is null in every indicator.
fn apply_one_hot(df: &mut DataFrame, name: &str, levels: &[String]) -> Result<Vec<String>> {
    let s = df.column(name)?.as_materialized_series().cast(&DataType::String)?;
    let ca = s.str()?;

    let mut output_columns = Vec::with_capacity(levels.len());
    for level in levels {
        let indicator_name = format!("{name}_{level}");
        let values: Vec<Option<i32>> = ca
            .into_iter()
            .map(|opt| opt.map(|v| i32::from(v == level.as_str())))
            .collect();
        df.with_column(Series::new(indicator_name.as_str().into(), values))?;
        output_columns.push(indicator_name);
    }

    let dropped = df.drop(name)?;
    *df = dropped;
    Ok(output_columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::inspect;

    fn sample_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "color".into(),
                &["red", "green", "blue", "red", "green", "blue", "red"],
            ),
            Column::new(
                "sex".into(),
                &[Some("m"), Some("f"), None, Some("m"), Some("f"), Some("m"), Some("f")],
            ),
            Column::new(
                "x".into(),
                &[1.0, 2.5, 3.1, 4.7, 5.2, 6.9, 7.3],
            ),
            Column::new("target".into(), &[0i64, 1, 0, 1, 0, 1, 0]),
        ])
        .unwrap()
    }

    fn encode(df: &DataFrame, cats: &[&str], ords: &[&str]) -> Result<(DataFrame, EncodingReport)> {
        let config = PrepConfig::default();
        let inspected = inspect(df, "target", cats, &config)?;
        encode_categoricals(df, "target", &inspected, cats, ords, &config)
    }

    #[test]
    fn test_resolver_decision_table() {
        let config = PrepConfig::default();
        assert_eq!(
            resolve_strategy("c", Some(2), false, &config).unwrap(),
            EncodingStrategy::Binary
        );
        assert_eq!(
            resolve_strategy("c", Some(3), false, &config).unwrap(),
            EncodingStrategy::OneHot
        );
        assert_eq!(
            resolve_strategy("c", Some(20), false, &config).unwrap(),
            EncodingStrategy::OneHot
        );
        assert_eq!(
            resolve_strategy("c", Some(21), false, &config).unwrap(),
            EncodingStrategy::Frequency
        );
        assert_eq!(
            resolve_strategy("c", Some(200), true, &config).unwrap(),
            EncodingStrategy::Ordinal
        );
        assert!(matches!(
            resolve_strategy("c", Some(51), false, &config),
            Err(PrepError::CardinalityUndeterminable { column }) if column == "c"
        ));
        assert!(matches!(
            resolve_strategy("c", None, false, &config),
            Err(PrepError::CardinalityUndeterminable { .. })
        ));
    }

    #[test]
    fn test_one_hot_expansion() {
        let df = sample_df();
        let (enc, report) = encode(&df, &["color", "sex"], &[]).unwrap();

        assert!(enc.column("color").is_err());
        for name in ["color_blue", "color_green", "color_red"] {
            let col = enc.column(name).unwrap();
            assert_eq!(col.as_materialized_series().null_count(), 0);
        }
        let meta = report.get("color").unwrap();
        assert_eq!(meta.strategy, EncodingStrategy::OneHot);
        assert_eq!(meta.output_columns.len(), 3);
        assert_eq!(meta.levels, vec!["blue", "green", "red"]);
    }

    #[test]
    fn test_binary_encoding_preserves_nulls() {
        let df = sample_df();
        let (enc, report) = encode(&df, &["color", "sex"], &[]).unwrap();

        assert_eq!(report.get("sex").unwrap().strategy, EncodingStrategy::Binary);
        let sex = enc.column("sex").unwrap().i32().unwrap();
        assert_eq!(sex.null_count(), 1);
        assert_eq!(sex.get(0), Some(1)); // levels sorted: f=0, m=1
        assert_eq!(sex.get(1), Some(0));
        assert!(sex.get(2).is_none());
    }

    #[test]
    fn test_ordinal_override() {
        let df = sample_df();
        let (enc, report) = encode(&df, &["color", "sex"], &["color"]).unwrap();

        assert_eq!(report.get("color").unwrap().strategy, EncodingStrategy::Ordinal);
        let color = enc.column("color").unwrap().i32().unwrap();
        // blue=0, green=1, red=2
        assert_eq!(color.get(0), Some(2));
        assert_eq!(color.get(2), Some(0));
    }

    #[test]
    fn test_numeric_stored_categorical() {
        let df = DataFrame::new(vec![
            Column::new("grade".into(), &[10i64, 20, 30, 10, 20, 30, 10]),
            Column::new("target".into(), &[0i64, 1, 0, 1, 0, 1, 0]),
        ])
        .unwrap();
        let (enc, report) = encode(&df, &["grade"], &[]).unwrap();

        // numeric level ordering, not lexicographic
        assert_eq!(report.get("grade").unwrap().levels, vec!["10", "20", "30"]);
        assert_eq!(report.get("grade").unwrap().strategy, EncodingStrategy::OneHot);
        assert!(enc.column("grade_10").is_ok());
    }

    #[test]
    fn test_frequency_encoding() {
        let n = 60usize;
        // 30 levels, two rows each
        let values: Vec<String> = (0..n).map(|i| format!("lv{:02}", i / 2)).collect();
        let targets: Vec<i64> = (0..n as i64).map(|i| i % 2).collect();
        let df = DataFrame::new(vec![
            Column::new("tag".into(), values),
            Column::new("target".into(), targets),
        ])
        .unwrap();

        let (enc, report) = encode(&df, &["tag"], &[]).unwrap();
        assert_eq!(report.get("tag").unwrap().strategy, EncodingStrategy::Frequency);
        let tag = enc.column("tag").unwrap().f64().unwrap();
        assert!((tag.get(0).unwrap() - 2.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_high_cardinality_fails() {
        let values: Vec<String> = (0..500).map(|i| format!("text-{i}")).collect();
        let targets: Vec<i64> = (0..500).map(|i| i % 2).collect();
        let df = DataFrame::new(vec![
            Column::new("notes".into(), values),
            Column::new("target".into(), targets),
        ])
        .unwrap();

        let err = encode(&df, &["notes"], &[]).unwrap_err();
        assert!(matches!(
            err,
            PrepError::CardinalityUndeterminable { column } if column == "notes"
        ));
    }

    #[test]
    fn test_high_cardinality_ordinal_override_succeeds() {
        let values: Vec<String> = (0..100).map(|i| format!("{i:03}")).collect();
        let targets: Vec<i64> = (0..100).map(|i| i % 2).collect();
        let df = DataFrame::new(vec![
            Column::new("rank".into(), values),
            Column::new("target".into(), targets),
        ])
        .unwrap();

        let (enc, report) = encode(&df, &["rank"], &["rank"]).unwrap();
        assert_eq!(report.get("rank").unwrap().strategy, EncodingStrategy::Ordinal);
        assert_eq!(enc.column("rank").unwrap().i32().unwrap().get(5), Some(5));
    }

    #[test]
    fn test_undeclared_ambiguous_left_alone() {
        let df = sample_df();
        // "sex" not declared: stays a string column
        let (enc, _) = encode(&df, &["color"], &[]).unwrap();
        assert_eq!(non_numeric_columns(&enc, "target"), vec!["sex".to_string()]);
    }

    #[test]
    fn test_postcondition_no_non_numeric() {
        let df = sample_df();
        let (enc, _) = encode(&df, &["color", "sex"], &[]).unwrap();
        assert!(non_numeric_columns(&enc, "target").is_empty());
    }

    #[test]
    fn test_target_never_encoded() {
        let df = DataFrame::new(vec![
            Column::new("color".into(), &["red", "blue", "red", "blue", "red", "blue", "red"]),
            Column::new("target".into(), &["yes", "no", "yes", "no", "yes", "no", "yes"]),
        ])
        .unwrap();

        let (enc, _) = encode(&df, &["color"], &[]).unwrap();
        assert_eq!(enc.column("target").unwrap().dtype(), &DataType::String);
        assert_eq!(non_numeric_columns(&enc, "target"), Vec::<String>::new());
    }
}
