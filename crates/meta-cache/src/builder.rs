//! Builder for [`Cache`] instances

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::loader::CacheLoader;
use std::hash::Hash;
use std::sync::Arc;

/// Collects cache options and produces caches
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    /// Create a builder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from an existing configuration
    pub fn from_config(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Set the maximum number of entries. Zero or negative disables eviction.
    pub fn max_size(mut self, max_size: i64) -> Self {
        self.config.max_size = max_size;
        self
    }

    /// Get the configuration the builder will use
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Build a cache without a default loader. Every miss needs a loader
    /// passed to [`Cache::get_with`].
    pub fn build<K, V>(&self) -> Cache<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        Cache::new(self.config, None)
    }

    /// Build a cache that falls back to `loader` on a miss
    pub fn build_with_loader<K, V, L>(&self, loader: L) -> Cache<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
        L: CacheLoader<K, V> + 'static,
    {
        Cache::new(self.config, Some(Arc::new(loader)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder() {
        let builder = CacheBuilder::new();
        assert_eq!(builder.config(), &CacheConfig::default());

        let cache = builder.build::<String, String>();
        assert!(cache.is_bounded());
        assert!(!cache.has_loader());
        assert_eq!(cache.max_size(), 1000);
    }

    #[test]
    fn test_builder_reuse() {
        let builder = CacheBuilder::from_config(CacheConfig::unbounded());

        let first = builder.build_with_loader(|key: &u32| -> anyhow::Result<u32> { Ok(*key) });
        let second = builder.max_size(2).build::<u32, u32>();

        assert!(!first.is_bounded());
        assert!(first.has_loader());
        assert!(second.is_bounded());
        assert_eq!(second.stats().max_size(), 2);
    }
}
