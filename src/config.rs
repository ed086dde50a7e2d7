//! Run configuration loaded from TOML.
//!
//! ```toml
//! [folds]
//! count = 10
//! shuffle = true
//! seed = 42
//! verify_positions = true
//! write_listings = true
//!
//! [normalize]
//! renumber_from = 2000
//! reconcile = true
//! ```
//!
//! Every field is optional. A missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{AlignError, AlignResult};
use crate::folds::DEFAULT_FOLD_COUNT;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub folds: FoldConfig,
    pub normalize: NormalizeConfig,
}

/// Settings for fold generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldConfig {
    /// Number of folds (k).
    pub count: usize,
    /// Shuffle sentence pairs before partitioning.
    pub shuffle: bool,
    /// Seed for the shuffle. Drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Check sentence order of every treebank fold after assembly.
    pub verify_positions: bool,
    /// Write `train_folds.txt` / `test_folds.txt`.
    pub write_listings: bool,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_FOLD_COUNT,
            shuffle: true,
            seed: None,
            verify_positions: true,
            write_listings: true,
        }
    }
}

/// Settings for corpus normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// First sentence number for leading-zero sentences. Renumbering is
    /// skipped when absent.
    pub renumber_from: Option<u64>,
    /// Repair non-canonical node ids.
    pub reconcile: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            renumber_from: None,
            reconcile: true,
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> AlignResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AlignError::Config {
            path: path.display().to_string(),
            message: format!("failed to read: {}", e),
        })?;

        Self::parse(&content).map_err(|message| AlignError::Config {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse TOML text.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse: {}", e))
    }
}
