//! Missing-value handling for continuous feature columns
//!
//! The handler never touches missingness in the target or in declared
//! categorical columns: those nulls come out bit-identical to the input.
//! The one exception is that rows whose target is null are removed up
//! front, for every policy, before any other logic runs.

use crate::config::PrepConfig;
use crate::error::{PrepError, Result};
use crate::imputation::{Estimator, Imputer, IterativeImputer};
use crate::inspection::{self, inspect};
use ndarray::Array2;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Policy for resolving missing values in continuous columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NanPolicy {
    /// Replace with the column mean
    Mean,
    /// Replace with the column median
    Median,
    /// Remove every row with a missing continuous value
    Drop,
    /// Multivariate iterative estimation (experimental)
    Impute,
}

/// Resolve missing values in the continuous columns of `df` under `policy`.
///
/// Rows with a null target are removed first. Returns the cleaned frame and
/// the number of cells that were filled in (informational only; always 0
/// for `Drop`).
///
/// # Errors
///
/// `ColumnNotFound`/`ConfigError` for bad column references,
/// `ExcessiveRowLoss` when `Drop` would keep fewer than
/// `config.min_keep_fraction` of the rows.
pub fn handle_continuous_nans(
    df: &DataFrame,
    target: &str,
    categoricals: &[&str],
    policy: NanPolicy,
    config: &PrepConfig,
) -> Result<(DataFrame, usize)> {
    inspection::validate_columns(df, target, categoricals, "categorical")?;

    let df = drop_null_target_rows(df, target)?;
    let inspected = inspect(&df, target, categoricals, config)?;
    let continuous: Vec<String> = inspected
        .continuous_columns()
        .into_iter()
        .map(str::to_string)
        .collect();

    debug!(
        policy = ?policy,
        n_continuous = continuous.len(),
        "handling missing continuous values"
    );

    match policy {
        NanPolicy::Mean | NanPolicy::Median => fill_with_stat(&df, &continuous, policy),
        NanPolicy::Drop => drop_incomplete_rows(&df, &continuous, config),
        NanPolicy::Impute => impute_multivariate(&df, &continuous, config),
    }
}

/// Target nulls force dropping: the affected rows are not part of the
/// addressable frame for any policy.
fn drop_null_target_rows(df: &DataFrame, target: &str) -> Result<DataFrame> {
    let series = df.column(target)?.as_materialized_series();
    if series.null_count() == 0 {
        return Ok(df.clone());
    }
    let mask = series.is_not_null();
    Ok(df.filter(&mask)?)
}

fn fill_with_stat(
    df: &DataFrame,
    continuous: &[String],
    policy: NanPolicy,
) -> Result<(DataFrame, usize)> {
    // Fill values are independent per column; compute them in parallel,
    // then apply serially.
    let fills: Vec<Option<(String, f64, usize)>> = continuous
        .par_iter()
        .map(|name| -> Result<Option<(String, f64, usize)>> {
            let series = df.column(name)?.as_materialized_series();
            let n_null = series.null_count();
            if n_null == 0 {
                return Ok(None);
            }

            let observed = observed_values(series)?;
            let stat = match policy {
                NanPolicy::Mean => mean(&observed),
                NanPolicy::Median => median(&observed),
                _ => unreachable!("fill_with_stat only handles Mean and Median"),
            };
            let stat = stat.ok_or_else(|| {
                PrepError::ComputationError(format!(
                    "column '{name}' has no observed values to fill from"
                ))
            })?;
            Ok(Some((name.clone(), stat, n_null)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = df.clone();
    let mut n_changed = 0usize;
    for (name, fill, n_null) in fills.into_iter().flatten() {
        let series = out.column(&name)?.as_materialized_series();
        let s = series.cast(&DataType::Float64)?;
        let ca = s.f64()?;
        let filled: Float64Chunked = ca
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(fill)))
            .collect();
        out.with_column(filled.with_name(name.as_str().into()).into_series())?;
        n_changed += n_null;
    }

    Ok((out, n_changed))
}

fn drop_incomplete_rows(
    df: &DataFrame,
    continuous: &[String],
    config: &PrepConfig,
) -> Result<(DataFrame, usize)> {
    let total = df.height();
    let mut keep = vec![true; total];
    for name in continuous {
        let nulls = df.column(name)?.as_materialized_series().is_null();
        for (i, is_null) in nulls.into_iter().enumerate() {
            if is_null.unwrap_or(false) {
                keep[i] = false;
            }
        }
    }

    let kept = keep.iter().filter(|&&k| k).count();
    if (kept as f64) < config.min_keep_fraction * (total as f64) {
        return Err(PrepError::ExcessiveRowLoss {
            kept,
            total,
            min_fraction: config.min_keep_fraction,
        });
    }

    if kept == total {
        return Ok((df.clone(), 0));
    }
    let mask = BooleanChunked::from_slice(PlSmallStr::EMPTY, &keep);
    Ok((df.filter(&mask)?, 0))
}

fn impute_multivariate(
    df: &DataFrame,
    continuous: &[String],
    config: &PrepConfig,
) -> Result<(DataFrame, usize)> {
    warn!(
        n_columns = continuous.len(),
        "Using experimental multivariate imputation for continuous columns"
    );

    let n_rows = df.height();
    let mut matrix = Array2::<f64>::zeros((n_rows, continuous.len()));
    let mut n_missing = 0usize;
    for (j, name) in continuous.iter().enumerate() {
        let s = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let ca = s.f64()?;
        for (i, v) in ca.into_iter().enumerate() {
            matrix[[i, j]] = match v {
                Some(x) => x,
                None => {
                    n_missing += 1;
                    f64::NAN
                }
            };
        }
    }

    if n_missing == 0 {
        return Ok((df.clone(), 0));
    }

    let mut imputer = IterativeImputer::new(Estimator::Linear)
        .with_max_iter(config.impute_max_iter)
        .with_tolerance(config.impute_tol);
    if let Some(seed) = config.random_state {
        imputer = imputer.with_seed(seed);
    }
    let completed = imputer.fit_transform(&matrix)?;

    // Write predictions back into the previously-missing cells only
    let mut out = df.clone();
    for (j, name) in continuous.iter().enumerate() {
        let series = out.column(name)?.as_materialized_series();
        if series.null_count() == 0 {
            continue;
        }
        let s = series.cast(&DataType::Float64)?;
        let ca = s.f64()?;
        let filled: Float64Chunked = ca
            .into_iter()
            .enumerate()
            .map(|(i, opt)| Some(opt.unwrap_or(completed[[i, j]])))
            .collect();
        out.with_column(filled.with_name(name.as_str().into()).into_series())?;
    }

    Ok((out, n_missing))
}

fn observed_values(series: &Series) -> Result<Vec<f64>> {
    let s = series.cast(&DataType::Float64)?;
    let ca = s.f64()?;
    Ok(ca.into_iter().flatten().collect())
}

fn mean(observed: &[f64]) -> Option<f64> {
    if observed.is_empty() {
        return None;
    }
    Some(observed.iter().sum::<f64>() / observed.len() as f64)
}

fn median(observed: &[f64]) -> Option<f64> {
    if observed.is_empty() {
        return None;
    }
    let mut sorted = observed.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(sorted[sorted.len() / 2])
}
