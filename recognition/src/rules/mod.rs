//! Rule data model: dimensions, categories, keywords and published rule
//! snapshots.
//!
//! Rules are authored in an external administrative interface and only ever
//! *read* here. A [`RuleSet`] is the immutable in-memory snapshot of one
//! dimension's active rules; the repository swaps whole snapshots atomically,
//! so nothing downstream ever observes a partially-updated rule set.

pub mod json_store;
pub mod repository;
pub mod store;

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;
use crate::rules::store::RuleSetInput;

/// Classification axis. A category belongs to exactly one dimension for its
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Which spare parts were used.
    Parts,
    /// What kind of work was performed.
    Labor,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Parts, Dimension::Labor];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Parts => "parts",
            Dimension::Labor => "labor",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named classification bucket within one dimension.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Display hint, opaque to the engine.
    pub color: String,
}

/// A keyword with phrases pre-normalized and ready for matching.
#[derive(Debug, Clone)]
pub struct Keyword {
    pub id: i64,
    pub category_id: i64,
    /// Canonical phrase, normalized.
    pub literal: String,
    /// Alternate phrases, normalized; empty entries are dropped at build.
    pub synonyms: Vec<String>,
    pub weight: f64,
}

/// Immutable snapshot of the active rules for one dimension.
///
/// Categories and keywords are held sorted by id so every downstream
/// iteration is deterministic.
#[derive(Debug)]
pub struct RuleSet {
    dimension: Dimension,
    categories: Vec<Category>,
    keywords: Vec<Keyword>,
    loaded_at: Instant,
}

impl RuleSet {
    /// Build a snapshot from raw store rows.
    ///
    /// Inactive rows are dropped. Keywords violating the `weight > 0`
    /// invariant, or whose normalized literal is empty, or whose category is
    /// missing or inactive, are treated as inactive (logged, never an
    /// error).
    pub fn build(dimension: Dimension, input: RuleSetInput) -> RuleSet {
        let mut categories: Vec<Category> = input
            .categories
            .into_iter()
            .filter(|row| row.active)
            .map(|row| Category {
                id: row.category_id,
                name: row.category_name,
                color: row.color,
            })
            .collect();
        categories.sort_by_key(|c| c.id);
        categories.dedup_by_key(|c| c.id);

        let mut keywords: Vec<Keyword> = Vec::new();
        for row in input.keywords {
            if !row.active {
                continue;
            }
            if !(row.weight > 0.0) {
                log::warn!(
                    "dropping {dimension} keyword {} ({:?}): weight {} is not positive",
                    row.keyword_id,
                    row.literal,
                    row.weight
                );
                continue;
            }
            let literal = normalize(&row.literal);
            if literal.is_empty() {
                log::warn!(
                    "dropping {dimension} keyword {} ({:?}): empty after normalization",
                    row.keyword_id,
                    row.literal
                );
                continue;
            }
            if categories.binary_search_by_key(&row.category_id, |c| c.id).is_err() {
                log::debug!(
                    "dropping {dimension} keyword {}: category {} absent or inactive",
                    row.keyword_id,
                    row.category_id
                );
                continue;
            }
            let synonyms: Vec<String> = row
                .synonyms
                .iter()
                .map(|s| normalize(s))
                .filter(|s| !s.is_empty())
                .collect();
            keywords.push(Keyword {
                id: row.keyword_id,
                category_id: row.category_id,
                literal,
                synonyms,
                weight: row.weight,
            });
        }
        keywords.sort_by_key(|k| k.id);
        keywords.dedup_by_key(|k| k.id);

        RuleSet {
            dimension,
            categories,
            keywords,
            loaded_at: Instant::now(),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.categories[i])
    }

    pub fn keyword(&self, id: i64) -> Option<&Keyword> {
        self.keywords
            .binary_search_by_key(&id, |k| k.id)
            .ok()
            .map(|i| &self.keywords[i])
    }

    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    pub(crate) fn is_expired(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() > ttl
    }
}
