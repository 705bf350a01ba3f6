use thiserror::Error;

use crate::rules::Dimension;

/// Failure while talking to the persistent rule store.
///
/// Raised by [`crate::rules::store::RuleStore`] implementations; the engine
/// never constructs these itself.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed rule data: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a Malformed error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// The persistent store could not be reached for a dimension that has no
/// snapshot yet. Fatal to the `analyze` call that needed it.
///
/// A failed *refresh* of an existing snapshot is not this error: the stale
/// snapshot keeps serving and the failure is logged instead.
#[derive(Error, Debug)]
#[error("failed to load {dimension} rules: {source}")]
pub struct RuleLoadError {
    pub dimension: Dimension,
    #[source]
    pub source: StoreError,
}

/// Invalid numeric parameter detected when constructing the engine.
///
/// Always surfaces at startup, never mid-analysis.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be within {min}..={max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("max_results must be at least 1")]
    ZeroMaxResults,

    #[error("cache_ttl_secs must be at least 1")]
    ZeroTtl,
}
