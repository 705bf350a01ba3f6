//! The persistent-store boundary.
//!
//! The engine never talks to a database directly. The calling application
//! implements [`RuleStore`] over whatever backend holds its categories and
//! keywords; the row types here mirror that input contract, `active` flags
//! included (the repository treats `active = false` rows as absent).

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::rules::Dimension;

fn default_active() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// One category as stored, before activity filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    pub category_id: i64,
    pub category_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// One keyword as stored, before activity and weight filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRow {
    pub keyword_id: i64,
    pub category_id: i64,
    pub literal: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Everything the store returns for one dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetInput {
    #[serde(default)]
    pub categories: Vec<CategoryRow>,
    #[serde(default)]
    pub keywords: Vec<KeywordRow>,
}

/// Read access to the persistent rule store.
///
/// Implementations own their retry policy; the repository only coalesces
/// concurrent reload attempts.
pub trait RuleStore: Send + Sync {
    fn load_rules(&self, dimension: Dimension) -> Result<RuleSetInput, StoreError>;
}

/// In-memory store for tests and embedded rule sets.
///
/// Rules can be replaced at runtime with [`MemoryRuleStore::set_rules`];
/// pair that with `RuleRepository::invalidate` to make edits visible.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: RwLock<HashMap<Dimension, RuleSetInput>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(parts: RuleSetInput, labor: RuleSetInput) -> Self {
        let store = Self::new();
        store.set_rules(Dimension::Parts, parts);
        store.set_rules(Dimension::Labor, labor);
        store
    }

    pub fn set_rules(&self, dimension: Dimension, input: RuleSetInput) {
        self.rules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(dimension, input);
    }
}

impl RuleStore for MemoryRuleStore {
    fn load_rules(&self, dimension: Dimension) -> Result<RuleSetInput, StoreError> {
        Ok(self
            .rules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&dimension)
            .cloned()
            .unwrap_or_default())
    }
}
