//! Value loaders
//!
//! A loader computes the value for a key on a cache miss. It may fail, and
//! its error is handed back to the caller untouched inside
//! [`CacheError::Load`](crate::CacheError::Load).
//!
//! A loader may call into other caches, or into the same cache for other
//! keys. Asking the same cache for the key it is currently loading blocks
//! forever.

/// Computes values for keys that are not cached yet
pub trait CacheLoader<K, V>: Send + Sync {
    /// Produce the value for `key`
    fn load(&self, key: &K) -> anyhow::Result<V>;
}

impl<K, V, F> CacheLoader<K, V> for F
where
    F: Fn(&K) -> anyhow::Result<V> + Send + Sync,
{
    fn load(&self, key: &K) -> anyhow::Result<V> {
        self(key)
    }
}
