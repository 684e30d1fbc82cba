//! Preprocessing configuration
//!
//! All tunable thresholds live here rather than being hard-coded at the
//! decision sites, so callers can calibrate them per dataset.

use serde::{Deserialize, Serialize};

/// Configuration for inspection, missing-value handling and encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// A numeric column with at most this many distinct values is treated
    /// as ambiguous (a possible unflagged categorical) rather than continuous
    pub min_continuous_unique: usize,

    /// Maximum number of levels for one-hot expansion. Columns with more
    /// levels get a compact numeric (frequency) encoding instead
    pub max_onehot_levels: usize,

    /// Above this many levels a declared categorical is considered
    /// free-text/ID-like and its cardinality undeterminable; encoding it
    /// requires an ordinal override
    pub max_auto_levels: usize,

    /// Minimum fraction of rows that must survive the Drop policy
    pub min_keep_fraction: f64,

    /// Maximum iterations for multivariate iterative imputation
    pub impute_max_iter: usize,

    /// Convergence tolerance for multivariate iterative imputation
    pub impute_tol: f64,

    /// Random seed for reproducible imputation
    pub random_state: Option<u64>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            min_continuous_unique: 5,
            max_onehot_levels: 20,
            max_auto_levels: 50,
            min_keep_fraction: 0.5,
            impute_max_iter: 10,
            impute_tol: 1e-3,
            random_state: None,
        }
    }
}

impl PrepConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the ambiguity threshold for numeric columns
    pub fn with_min_continuous_unique(mut self, n: usize) -> Self {
        self.min_continuous_unique = n;
        self
    }

    /// Builder method to set the one-hot level cap
    pub fn with_max_onehot_levels(mut self, n: usize) -> Self {
        self.max_onehot_levels = n;
        self
    }

    /// Builder method to set the undeterminable-cardinality cutoff
    pub fn with_max_auto_levels(mut self, n: usize) -> Self {
        self.max_auto_levels = n;
        self
    }

    /// Builder method to set the Drop-policy viability fraction
    pub fn with_min_keep_fraction(mut self, fraction: f64) -> Self {
        self.min_keep_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set imputation iteration cap
    pub fn with_impute_max_iter(mut self, n: usize) -> Self {
        self.impute_max_iter = n.max(1);
        self
    }

    /// Builder method to set imputation convergence tolerance
    pub fn with_impute_tol(mut self, tol: f64) -> Self {
        self.impute_tol = tol.max(1e-10);
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PrepConfig::default();
        assert_eq!(config.max_onehot_levels, 20);
        assert_eq!(config.min_continuous_unique, 5);
        assert!(config.max_auto_levels > config.max_onehot_levels);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PrepConfig::new()
            .with_max_onehot_levels(8)
            .with_min_keep_fraction(0.25)
            .with_random_state(42);

        assert_eq!(config.max_onehot_levels, 8);
        assert_eq!(config.min_keep_fraction, 0.25);
        assert_eq!(config.random_state, Some(42));
    }

    #[test]
    fn test_keep_fraction_clamped() {
        let config = PrepConfig::new().with_min_keep_fraction(1.5);
        assert_eq!(config.min_keep_fraction, 1.0);
    }

    #[test]
    fn test_config_serialize() {
        let config = PrepConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("max_onehot_levels"));
        let back: PrepConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_onehot_levels, config.max_onehot_levels);
    }
}
