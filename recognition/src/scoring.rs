//! Confidence aggregation from raw match hits.
//!
//! Per category: arithmetic mean of the component scores of its
//! distinct-keyword hits, plus a flat context bonus when two or more
//! distinct keywords matched, clamped to [0,100]. Adding another matching
//! keyword to a qualifying category can never lower its confidence.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::matching::{MatchHit, MatchKind};
use crate::rules::RuleSet;

/// Aggregated confidence for one category.
#[derive(Debug, Clone)]
pub struct CategoryScore {
    pub category_id: i64,
    /// In [0,100].
    pub confidence: f64,
    /// Distinct matched phrases, in keyword order.
    pub matched_texts: Vec<String>,
    /// Distinct contributing keywords, in keyword order.
    pub keyword_ids: Vec<i64>,
}

impl CategoryScore {
    pub fn keyword_count(&self) -> usize {
        self.keyword_ids.len()
    }
}

/// Group hits by category, aggregate confidences, drop categories below the
/// threshold, and return the survivors sorted by descending confidence
/// (category id breaks ties), capped at `max_results`.
pub fn score(hits: &[MatchHit], ruleset: &RuleSet, config: &EngineConfig) -> Vec<CategoryScore> {
    // BTreeMap keeps category grouping deterministic.
    let mut by_category: BTreeMap<i64, Vec<&MatchHit>> = BTreeMap::new();
    for hit in hits {
        let entry = by_category.entry(hit.category_id).or_default();
        // The matcher emits one hit per keyword; the guard keeps the
        // distinct-keyword rule intact for hits assembled elsewhere.
        if !entry.iter().any(|h| h.keyword_id == hit.keyword_id) {
            entry.push(hit);
        }
    }

    let mut scores: Vec<CategoryScore> = by_category
        .into_iter()
        .filter_map(|(category_id, hits)| {
            let sum: f64 = hits.iter().map(|hit| component(hit, ruleset, config)).sum();
            let mut confidence = sum / hits.len() as f64;
            if hits.len() >= 2 {
                confidence += config.context_bonus;
            }
            let confidence = confidence.clamp(0.0, 100.0);
            if confidence < config.confidence_threshold {
                return None;
            }

            let mut matched_texts: Vec<String> = Vec::new();
            for hit in &hits {
                if !matched_texts.contains(&hit.matched_text) {
                    matched_texts.push(hit.matched_text.clone());
                }
            }
            let keyword_ids: Vec<i64> = hits.iter().map(|h| h.keyword_id).collect();

            Some(CategoryScore {
                category_id,
                confidence,
                matched_texts,
                keyword_ids,
            })
        })
        .collect();

    scores.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    scores.truncate(config.max_results);
    scores
}

fn component(hit: &MatchHit, ruleset: &RuleSet, config: &EngineConfig) -> f64 {
    let weight = ruleset.keyword(hit.keyword_id).map_or(1.0, |k| k.weight);
    match hit.kind {
        MatchKind::Exact => config.exact_weight_base * weight,
        MatchKind::Synonym => config.synonym_weight_base * weight,
        MatchKind::Fuzzy => hit.similarity * config.fuzzy_weight_base * weight,
    }
}
