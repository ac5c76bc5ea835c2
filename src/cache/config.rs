//! Cache configuration.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Default acceptance threshold for fuzzy matches.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.95;

/// Diagnostic detail emitted by a lookup. Never changes the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Verbosity {
    /// Nothing is emitted.
    #[default]
    Silent,
    /// Hit or miss and the best score.
    Summary,
    /// Also candidate count and embedding latency.
    Detailed,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Summary,
            _ => Verbosity::Detailed,
        }
    }
}

impl From<Verbosity> for u8 {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Silent => 0,
            Verbosity::Summary => 1,
            Verbosity::Detailed => 2,
        }
    }
}

/// Defaults used by `lookup` and `get_or_compute`.
///
/// `min_similarity` is not range-checked. Values above 1 make every fuzzy
/// lookup miss, values below -1 accept any candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub min_similarity: f32,
    pub verbosity: Verbosity,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            verbosity: Verbosity::Silent,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for hash-equality caches: only exact hits are accepted.
    pub fn exact() -> Self {
        Self::default().with_min_similarity(1.0)
    }

    pub fn with_min_similarity(mut self, threshold: f32) -> Self {
        self.min_similarity = threshold;
        self
    }

    pub fn with_verbosity(mut self, verbosity: impl Into<Verbosity>) -> Self {
        self.verbosity = verbosity.into();
        self
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
