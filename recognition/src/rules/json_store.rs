//! Rule loading from a JSON document.
//!
//! One file holds both dimensions' rows in the same shape as the store
//! input contract:
//!
//! ```json
//! {
//!   "parts":  { "categories": [...], "keywords": [...] },
//!   "labor":  { "categories": [...], "keywords": [...] }
//! }
//! ```
//!
//! The file is re-read on every load, so an `invalidate` after editing it
//! picks the changes up immediately. Used by the CLI and by embedders that
//! keep their rules in a flat file instead of a database.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::rules::store::{RuleSetInput, RuleStore};
use crate::rules::Dimension;

/// The on-disk document: one [`RuleSetInput`] per dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub parts: RuleSetInput,
    #[serde(default)]
    pub labor: RuleSetInput,
}

impl RuleFile {
    pub fn dimension(&self, dimension: Dimension) -> &RuleSetInput {
        match dimension {
            Dimension::Parts => &self.parts,
            Dimension::Labor => &self.labor,
        }
    }
}

/// A [`RuleStore`] backed by a JSON file on disk.
pub struct JsonRuleStore {
    path: PathBuf,
}

impl JsonRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document.
    pub fn load_file(&self) -> Result<RuleFile, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            StoreError::unavailable(format!("{}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::malformed(format!("{}: {e}", self.path.display())))
    }
}

impl RuleStore for JsonRuleStore {
    fn load_rules(&self, dimension: Dimension) -> Result<RuleSetInput, StoreError> {
        Ok(self.load_file()?.dimension(dimension).clone())
    }
}
