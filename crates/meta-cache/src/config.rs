//! Cache configuration options

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

/// Configuration for a metadata cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries. Zero or negative disables eviction.
    pub max_size: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_size: 1000 }
    }
}

impl CacheConfig {
    /// Create a configuration bounded to `max_size` entries
    pub fn new(max_size: i64) -> Self {
        Self { max_size }
    }

    /// Create a configuration that never evicts
    pub fn unbounded() -> Self {
        Self { max_size: 0 }
    }

    /// Set the maximum number of entries
    pub fn with_max_size(mut self, max_size: i64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Check if eviction is enabled
    pub fn is_bounded(&self) -> bool {
        self.max_size > 0
    }

    /// The entry bound, `None` when unbounded
    pub fn capacity(&self) -> Option<NonZeroUsize> {
        usize::try_from(self.max_size)
            .ok()
            .and_then(NonZeroUsize::new)
    }

    /// Parse a configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CacheConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
