pub mod analyze;
pub mod batch;
pub mod check;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::RecognitionEngine;
use crate::rules::json_store::JsonRuleStore;

/// Build an engine over a JSON rule file, with an optional threshold
/// override.
pub(crate) fn build_engine(
    rules_path: &str,
    threshold: Option<f64>,
) -> Result<RecognitionEngine, String> {
    let mut config = EngineConfig::default();
    if let Some(threshold) = threshold {
        config.confidence_threshold = threshold;
    }
    RecognitionEngine::new(Arc::new(JsonRuleStore::new(rules_path)), config)
        .map_err(|e| e.to_string())
}
