//! The classification engine: normalize → match → score across both
//! dimensions, assembled into one result.
//!
//! Analysis is pure CPU work over an immutable rule snapshot, so single
//! calls are synchronous and the batch entry point is a bounded parallel
//! map. The only blocking path is the repository's reload.

mod segments;

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::config::EngineConfig;
use crate::error::{ConfigError, RuleLoadError};
use crate::matching;
use crate::normalize::normalize;
use crate::rules::repository::RuleRepository;
use crate::rules::store::RuleStore;
use crate::rules::{Dimension, RuleSet};
use crate::scoring;
use segments::Routed;

/// One category detected in one description, with display metadata joined
/// in from the rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedCategory {
    pub category_id: i64,
    pub category_name: String,
    pub color: String,
    /// In [0,100].
    pub confidence: f64,
    pub matched_texts: Vec<String>,
    /// Distinct keywords that contributed, for the caller's audit trail.
    pub keyword_ids: Vec<i64>,
}

/// The structured output of classifying one description across both
/// dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub parts_detected: Vec<DetectedCategory>,
    pub labor_detected: Vec<DetectedCategory>,
    /// Mean of all surviving category confidences, absent when nothing
    /// cleared the threshold.
    pub overall_confidence: Option<f64>,
    pub total_detections: usize,
    pub processing_time_ms: f64,
    /// Echo of the caller's record id, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
}

impl AnalysisResult {
    /// Highest-confidence parts category, if any.
    pub fn best_part(&self) -> Option<&DetectedCategory> {
        self.parts_detected.first()
    }

    /// Highest-confidence labor category, if any.
    pub fn best_labor(&self) -> Option<&DetectedCategory> {
        self.labor_detected.first()
    }
}

/// Aggregated usage of one category across a batch of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryUsage {
    pub category_id: i64,
    pub category_name: String,
    pub color: String,
    pub dimension: Dimension,
    pub occurrences: usize,
    pub mean_confidence: f64,
}

/// Rule-driven recognition over maintenance descriptions.
///
/// Owns its configuration and an injected rule repository; safe to share
/// across threads, and `analyze` calls run in parallel without contention
/// beyond the snapshot pointer.
pub struct RecognitionEngine {
    config: EngineConfig,
    repository: Arc<RuleRepository>,
}

impl RecognitionEngine {
    /// Build an engine over the given store. Fails fast on invalid
    /// configuration.
    pub fn new(store: Arc<dyn RuleStore>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let repository = Arc::new(RuleRepository::new(store, config.cache_ttl()));
        Ok(Self { config, repository })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &RuleRepository {
        &self.repository
    }

    /// Force a rule reload before the next analysis. Call after any
    /// administrative edit of categories or keywords.
    pub fn invalidate(&self, dimension: Option<Dimension>) {
        self.repository.invalidate(dimension);
    }

    /// Classify one description across both dimensions.
    ///
    /// Empty or whitespace-only input is not an error: it produces a result
    /// with empty detection lists and no overall confidence.
    pub fn analyze(
        &self,
        description: &str,
        source_id: Option<i64>,
    ) -> Result<AnalysisResult, RuleLoadError> {
        let parts_rules = self.repository.get_ruleset(Dimension::Parts)?;
        let labor_rules = self.repository.get_ruleset(Dimension::Labor)?;
        Ok(analyze_snapshot(
            &self.config,
            description,
            source_id,
            &parts_rules,
            &labor_rules,
        ))
    }

    /// Classify many descriptions in parallel.
    ///
    /// Each dimension's rule set is fetched once for the whole batch; the
    /// descriptions then fan out over a worker pool sized to the available
    /// cores. Output order matches input order.
    pub async fn analyze_batch(
        &self,
        items: Vec<(String, Option<i64>)>,
    ) -> Result<Vec<AnalysisResult>, RuleLoadError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let parts_rules = self.repository.get_ruleset(Dimension::Parts)?;
        let labor_rules = self.repository.get_ruleset(Dimension::Labor)?;

        let workers = std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get);
        let semaphore = Arc::new(Semaphore::new(workers));
        log::debug!("analyzing batch of {} descriptions ({workers} workers)", items.len());

        let tasks: Vec<_> = items
            .into_iter()
            .map(|(description, source_id)| {
                let sem = Arc::clone(&semaphore);
                let config = self.config.clone();
                let parts = Arc::clone(&parts_rules);
                let labor = Arc::clone(&labor_rules);
                tokio::spawn(async move {
                    let _permit = sem.acquire().await.expect("semaphore closed unexpectedly");
                    tokio::task::spawn_blocking(move || {
                        analyze_snapshot(&config, &description, source_id, &parts, &labor)
                    })
                    .await
                })
            })
            .collect();

        let results = join_all(tasks).await;
        Ok(results
            .into_iter()
            .map(|joined| {
                joined
                    .and_then(|inner| inner)
                    .expect("analysis task panicked")
            })
            .collect())
    }
}

/// Run both classification passes against already-loaded snapshots.
fn analyze_snapshot(
    config: &EngineConfig,
    description: &str,
    source_id: Option<i64>,
    parts_rules: &RuleSet,
    labor_rules: &RuleSet,
) -> AnalysisResult {
    let started = Instant::now();

    let (parts_text, labor_text) = match segments::route(description) {
        Routed::Whole => {
            let text = normalize(description);
            (text.clone(), text)
        }
        Routed::Split { parts, labor } => (normalize(&parts), normalize(&labor)),
    };

    let parts_detected = run_dimension(config, &parts_text, parts_rules);
    let labor_detected = run_dimension(config, &labor_text, labor_rules);

    let total_detections = parts_detected.len() + labor_detected.len();
    let overall_confidence = if total_detections == 0 {
        None
    } else {
        let sum: f64 = parts_detected
            .iter()
            .chain(labor_detected.iter())
            .map(|d| d.confidence)
            .sum();
        Some(sum / total_detections as f64)
    };

    AnalysisResult {
        parts_detected,
        labor_detected,
        overall_confidence,
        total_detections,
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        source_id,
    }
}

fn run_dimension(config: &EngineConfig, normalized_text: &str, rules: &RuleSet) -> Vec<DetectedCategory> {
    let hits = matching::find_hits(normalized_text, rules, config.fuzzy_threshold);
    if config.debug_mode {
        log::debug!(
            "{} dimension: {} raw hits in {:?}",
            rules.dimension(),
            hits.len(),
            normalized_text
        );
    }

    scoring::score(&hits, rules, config)
        .into_iter()
        .filter_map(|score| {
            let category = rules.category(score.category_id)?;
            Some(DetectedCategory {
                category_id: score.category_id,
                category_name: category.name.clone(),
                color: category.color.clone(),
                confidence: score.confidence,
                matched_texts: score.matched_texts,
                keyword_ids: score.keyword_ids,
            })
        })
        .collect()
}

/// Aggregate detections across a batch: per-category occurrence counts and
/// mean confidence, most used first.
pub fn summarize(results: &[AnalysisResult]) -> Vec<CategoryUsage> {
    use std::collections::BTreeMap;

    struct Tally {
        name: String,
        color: String,
        occurrences: usize,
        confidence_sum: f64,
    }

    let mut tallies: BTreeMap<(Dimension, i64), Tally> = BTreeMap::new();
    for result in results {
        let detections = result
            .parts_detected
            .iter()
            .map(|d| (Dimension::Parts, d))
            .chain(result.labor_detected.iter().map(|d| (Dimension::Labor, d)));
        for (dimension, detected) in detections {
            let tally = tallies.entry((dimension, detected.category_id)).or_insert_with(|| Tally {
                name: detected.category_name.clone(),
                color: detected.color.clone(),
                occurrences: 0,
                confidence_sum: 0.0,
            });
            tally.occurrences += 1;
            tally.confidence_sum += detected.confidence;
        }
    }

    let mut usages: Vec<CategoryUsage> = tallies
        .into_iter()
        .map(|((dimension, category_id), tally)| CategoryUsage {
            category_id,
            category_name: tally.name,
            color: tally.color,
            dimension,
            occurrences: tally.occurrences,
            mean_confidence: tally.confidence_sum / tally.occurrences as f64,
        })
        .collect();

    usages.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    usages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::store::{CategoryRow, KeywordRow, MemoryRuleStore, RuleSetInput};

    fn category(id: i64, name: &str, color: &str) -> CategoryRow {
        CategoryRow {
            category_id: id,
            category_name: name.to_owned(),
            color: color.to_owned(),
            active: true,
        }
    }

    fn keyword(id: i64, category_id: i64, literal: &str, synonyms: &[&str]) -> KeywordRow {
        KeywordRow {
            keyword_id: id,
            category_id,
            literal: literal.to_owned(),
            synonyms: synonyms.iter().map(|s| (*s).to_owned()).collect(),
            weight: 1.0,
            active: true,
        }
    }

    /// Parts: Filters {filter/strainer, cartridge}, Hoses {hose}.
    /// Labor: Welding {welding/weld}, Servicing {service}.
    fn sample_store() -> Arc<MemoryRuleStore> {
        let parts = RuleSetInput {
            categories: vec![
                category(1, "Filters", "#007bff"),
                category(2, "Hoses", "#28a745"),
            ],
            keywords: vec![
                keyword(10, 1, "filter", &["strainer"]),
                keyword(11, 1, "cartridge", &[]),
                keyword(20, 2, "hose", &[]),
            ],
        };
        let labor = RuleSetInput {
            categories: vec![
                category(5, "Welding", "#dc3545"),
                category(6, "Servicing", "#ffc107"),
            ],
            keywords: vec![
                keyword(50, 5, "welding", &["weld"]),
                keyword(60, 6, "service", &[]),
            ],
        };
        Arc::new(MemoryRuleStore::with_rules(parts, labor))
    }

    fn engine() -> RecognitionEngine {
        RecognitionEngine::new(sample_store(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = EngineConfig {
            fuzzy_threshold: 2.0,
            ..EngineConfig::default()
        };
        assert!(RecognitionEngine::new(sample_store(), config).is_err());
    }

    #[test]
    fn test_exact_hit_full_confidence() {
        let result = engine().analyze("replaced the oil filter", None).unwrap();
        assert_eq!(result.parts_detected.len(), 1);
        let detected = &result.parts_detected[0];
        assert_eq!(detected.category_name, "Filters");
        assert_eq!(detected.color, "#007bff");
        assert_eq!(detected.confidence, 100.0);
        assert_eq!(detected.matched_texts, vec!["filter"]);
        assert!(result.labor_detected.is_empty());
        assert_eq!(result.total_detections, 1);
        assert_eq!(result.overall_confidence, Some(100.0));
    }

    #[test]
    fn test_synonym_hit_ninety() {
        let result = engine().analyze("changed the oil strainer", None).unwrap();
        assert_eq!(result.parts_detected.len(), 1);
        assert_eq!(result.parts_detected[0].confidence, 90.0);
    }

    #[test]
    fn test_fuzzy_hit_scaled() {
        let result = engine().analyze("changd the flter", None).unwrap();
        assert_eq!(result.parts_detected.len(), 1);
        let confidence = result.parts_detected[0].confidence;
        // Ratio 1 - 1/6 against "filter", times the fuzzy base of 85
        let expected = (1.0 - 1.0 / 6.0) * 85.0;
        assert!((confidence - expected).abs() < 0.5, "confidence={confidence}");
    }

    #[test]
    fn test_two_keywords_bonus_clamped() {
        // "strainer" and a near-exact "cartridge": two distinct keywords in
        // Filters, mean + bonus clamps at 100
        let result = engine()
            .analyze("strainer and cartridge replaced", None)
            .unwrap();
        let filters = &result.parts_detected[0];
        assert_eq!(filters.category_name, "Filters");
        assert_eq!(filters.keyword_ids, vec![10, 11]);
        assert_eq!(filters.confidence, 100.0);
    }

    #[test]
    fn test_weak_fuzzy_excluded_by_threshold() {
        // "hse" vs "hose": ratio 0.75 is below the fuzzy threshold, and
        // nothing else matches
        let result = engine().analyze("checked the hse", None).unwrap();
        assert!(result.parts_detected.is_empty());
        assert!(result.labor_detected.is_empty());
        assert_eq!(result.overall_confidence, None);
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        for input in ["", "   \t  "] {
            let result = engine().analyze(input, None).unwrap();
            assert!(result.parts_detected.is_empty());
            assert!(result.labor_detected.is_empty());
            assert_eq!(result.overall_confidence, None);
            assert_eq!(result.total_detections, 0);
        }
    }

    #[test]
    fn test_both_dimensions_detected() {
        let result = engine()
            .analyze("welding on the hose bracket", None)
            .unwrap();
        assert_eq!(result.parts_detected[0].category_name, "Hoses");
        assert_eq!(result.labor_detected[0].category_name, "Welding");
        assert_eq!(result.total_detections, 2);
        // Overall is the mean across both dimensions
        let expected = (result.parts_detected[0].confidence + result.labor_detected[0].confidence) / 2.0;
        assert_eq!(result.overall_confidence, Some(expected));
    }

    #[test]
    fn test_deterministic_results() {
        let engine = engine();
        let first = engine.analyze("filter and hose and welding", Some(7)).unwrap();
        let second = engine.analyze("filter and hose and welding", Some(7)).unwrap();
        assert_eq!(first.parts_detected, second.parts_detected);
        assert_eq!(first.labor_detected, second.labor_detected);
        assert_eq!(first.overall_confidence, second.overall_confidence);
        assert_eq!(first.total_detections, second.total_detections);
        assert_eq!(first.source_id, second.source_id);
    }

    #[test]
    fn test_source_id_passthrough() {
        let result = engine().analyze("filter", Some(42)).unwrap();
        assert_eq!(result.source_id, Some(42));
        assert_eq!(result.best_part().map(|d| d.category_id), Some(1));
        assert!(result.best_labor().is_none());
    }

    #[test]
    fn test_structured_description_routes_dimensions() {
        // "service" appears only in the labor segment, so the parts pass
        // must not see it; "filter" stays in the parts pass.
        let result = engine()
            .analyze("Parts: one oil filter | Work done: full service", None)
            .unwrap();
        assert_eq!(result.parts_detected[0].category_name, "Filters");
        assert_eq!(result.labor_detected[0].category_name, "Servicing");

        // The same words unrouted match "service" in labor and "filter" in
        // parts too, so routing must have excluded cross-dimension text:
        // "filter" must not fuzzy-match anything in labor.
        assert_eq!(result.labor_detected.len(), 1);
    }

    #[test]
    fn test_invalidate_picks_up_rule_edits() {
        let store = sample_store();
        let engine =
            RecognitionEngine::new(Arc::clone(&store) as Arc<dyn RuleStore>, EngineConfig::default())
                .unwrap();

        let before = engine.analyze("replaced the gasket", None).unwrap();
        assert!(before.parts_detected.is_empty());

        store.set_rules(
            Dimension::Parts,
            RuleSetInput {
                categories: vec![category(3, "Seals", "#6610f2")],
                keywords: vec![keyword(30, 3, "gasket", &[])],
            },
        );
        engine.invalidate(Some(Dimension::Parts));

        let after = engine.analyze("replaced the gasket", None).unwrap();
        assert_eq!(after.parts_detected[0].category_name, "Seals");
    }

    #[test]
    fn test_first_load_failure_propagates() {
        struct DownStore;
        impl RuleStore for DownStore {
            fn load_rules(
                &self,
                _dimension: Dimension,
            ) -> Result<RuleSetInput, crate::error::StoreError> {
                Err(crate::error::StoreError::unavailable("no connection"))
            }
        }

        let engine = RecognitionEngine::new(Arc::new(DownStore), EngineConfig::default()).unwrap();
        assert!(engine.analyze("filter", None).is_err());
    }

    #[test]
    fn test_output_contract_field_names() {
        let result = engine().analyze("replaced the oil filter", None).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        for field in [
            "parts_detected",
            "labor_detected",
            "overall_confidence",
            "total_detections",
            "processing_time_ms",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        // source_id is omitted when absent
        assert!(json.get("source_id").is_none());
        let detected = &json["parts_detected"][0];
        for field in ["category_id", "category_name", "color", "confidence", "matched_texts"] {
            assert!(detected.get(field).is_some(), "missing field {field}");
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let engine = engine();
        let items = vec![
            ("replaced the oil filter".to_owned(), Some(1)),
            (String::new(), Some(2)),
            ("welding repair".to_owned(), Some(3)),
        ];
        let results = engine.analyze_batch(items).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].source_id, Some(1));
        assert_eq!(results[0].parts_detected[0].category_name, "Filters");
        assert_eq!(results[1].source_id, Some(2));
        assert_eq!(results[1].total_detections, 0);
        assert_eq!(results[2].source_id, Some(3));
        assert_eq!(results[2].labor_detected[0].category_name, "Welding");
    }

    #[tokio::test]
    async fn test_batch_loads_rules_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingStore {
            loads: AtomicUsize,
        }
        impl RuleStore for CountingStore {
            fn load_rules(
                &self,
                _dimension: Dimension,
            ) -> Result<RuleSetInput, crate::error::StoreError> {
                self.loads.fetch_add(1, Ordering::SeqCst);
                Ok(RuleSetInput::default())
            }
        }

        let store = Arc::new(CountingStore {
            loads: AtomicUsize::new(0),
        });
        let engine =
            RecognitionEngine::new(Arc::clone(&store) as Arc<dyn RuleStore>, EngineConfig::default())
                .unwrap();

        let items: Vec<(String, Option<i64>)> =
            (0..32).map(|i| (format!("description {i}"), None)).collect();
        engine.analyze_batch(items).await.unwrap();

        // One load per dimension for the whole batch
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = engine().analyze_batch(Vec::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_summarize_counts_and_means() {
        let engine = engine();
        let results = vec![
            engine.analyze("replaced the oil filter", None).unwrap(),
            engine.analyze("oil strainer and welding", None).unwrap(),
            engine.analyze("welding the frame", None).unwrap(),
        ];
        let usage = summarize(&results);

        let filters = usage
            .iter()
            .find(|u| u.category_name == "Filters")
            .expect("Filters missing");
        assert_eq!(filters.occurrences, 2);
        assert_eq!(filters.dimension, Dimension::Parts);
        // 100 (exact) and 90 (synonym)
        assert!((filters.mean_confidence - 95.0).abs() < 1e-9);

        let welding = usage
            .iter()
            .find(|u| u.category_name == "Welding")
            .expect("Welding missing");
        assert_eq!(welding.occurrences, 2);
        assert_eq!(welding.dimension, Dimension::Labor);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_empty());
    }
}
