//! Shapes for the caller-persisted audit trail.
//!
//! The engine never writes classification history itself; it exposes the
//! record type and a constructor so the calling application can persist one
//! row per detected category.

use serde::{Deserialize, Serialize};

use crate::engine::{AnalysisResult, DetectedCategory};
use crate::rules::Dimension;

/// One persisted classification: which category was inferred for which
/// source record, and from what evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub source_id: i64,
    pub dimension: Dimension,
    pub category_id: i64,
    pub category_name: String,
    pub confidence: f64,
    pub matched_texts: Vec<String>,
    pub keyword_ids: Vec<i64>,
}

impl ClassificationRecord {
    pub fn from_detection(
        source_id: i64,
        dimension: Dimension,
        detected: &DetectedCategory,
    ) -> Self {
        Self {
            source_id,
            dimension,
            category_id: detected.category_id,
            category_name: detected.category_name.clone(),
            confidence: detected.confidence,
            matched_texts: detected.matched_texts.clone(),
            keyword_ids: detected.keyword_ids.clone(),
        }
    }

    /// All records for one analysis, both dimensions, in result order.
    pub fn from_result(source_id: i64, result: &AnalysisResult) -> Vec<ClassificationRecord> {
        result
            .parts_detected
            .iter()
            .map(|d| Self::from_detection(source_id, Dimension::Parts, d))
            .chain(
                result
                    .labor_detected
                    .iter()
                    .map(|d| Self::from_detection(source_id, Dimension::Labor, d)),
            )
            .collect()
    }
}
