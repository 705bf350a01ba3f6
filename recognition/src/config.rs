//! Engine configuration.
//!
//! A single immutable value object controls every numeric threshold and
//! weight used by matching and scoring. Validation runs once at engine
//! construction; an invalid field fails fast, never mid-analysis.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Categories scoring below this are dropped from results.
    pub confidence_threshold: f64,

    /// Component score base for an exact literal hit.
    pub exact_weight_base: f64,

    /// Component score base for a synonym hit.
    pub synonym_weight_base: f64,

    /// Component score base for an approximate hit, scaled by its ratio.
    pub fuzzy_weight_base: f64,

    /// Minimum similarity ratio for an approximate hit to count.
    pub fuzzy_threshold: f64,

    /// Added once to a category with two or more distinct matching keywords.
    pub context_bonus: f64,

    /// Caps the number of category results returned per dimension.
    pub max_results: usize,

    /// Rule snapshot lifetime before a refresh is attempted.
    pub cache_ttl_secs: u64,

    /// Log per-dimension hit detail at debug level.
    pub debug_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 50.0,
            exact_weight_base: 100.0,
            synonym_weight_base: 90.0,
            fuzzy_weight_base: 85.0,
            fuzzy_threshold: 0.8,
            context_bonus: 10.0,
            max_results: 10,
            cache_ttl_secs: 15 * 60,
            debug_mode: false,
        }
    }
}

impl EngineConfig {
    /// Check every numeric field. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("exact_weight_base", self.exact_weight_base),
            ("synonym_weight_base", self.synonym_weight_base),
            ("fuzzy_weight_base", self.fuzzy_weight_base),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "confidence_threshold",
                value: self.confidence_threshold,
                min: 0.0,
                max: 100.0,
            });
        }

        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "fuzzy_threshold",
                value: self.fuzzy_threshold,
                min: 0.0,
                max: 1.0,
            });
        }

        if self.context_bonus < 0.0 || !self.context_bonus.is_finite() {
            return Err(ConfigError::Negative {
                field: "context_bonus",
                value: self.context_bonus,
            });
        }

        if self.max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_weight_base_rejected() {
        let config = EngineConfig {
            exact_weight_base: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "exact_weight_base",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_weight_base_rejected() {
        let config = EngineConfig {
            synonym_weight_base: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fuzzy_threshold_above_one_rejected() {
        let config = EngineConfig {
            fuzzy_threshold: 1.2,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "fuzzy_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_confidence_threshold_out_of_range_rejected() {
        let config = EngineConfig {
            confidence_threshold: 120.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            confidence_threshold: -1.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_context_bonus_rejected() {
        let config = EngineConfig {
            context_bonus: -5.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "context_bonus",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let config = EngineConfig {
            max_results: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroMaxResults)));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = EngineConfig {
            cache_ttl_secs: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTtl)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"confidence_threshold": 30.0}"#).unwrap();
        assert_eq!(config.confidence_threshold, 30.0);
        assert_eq!(config.max_results, 10);
        assert_eq!(config.cache_ttl_secs, 900);
        assert!(config.validate().is_ok());
    }
}
