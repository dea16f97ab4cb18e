//! Concurrent LRU store
//!
//! Entries live in a [`DashMap`]. Each key maps to a shared slot whose value is
//! computed at most once through a [`OnceCell`], so concurrent misses on the
//! same key run the loader once and all observe the same value. A failed load
//! leaves the cell empty and the slot is dropped from the map.
//!
//! Bounded caches additionally keep every slot in a [`LinkedList`] ordered by
//! recency, guarded by a single mutex. Every access relinks the slot at the
//! head, then a trim pass pops tails until the list is back within bounds.
//! The trim pass collects victims under the list lock and only removes them
//! from the map once that lock is released; no code path holds the list lock
//! while touching the map.

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::list::{LinkedList, NodeId};
use crate::loader::CacheLoader;
use crate::stats::{CacheCounters, CacheStats};
use ahash::{AHashSet, RandomState};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, trace};

/// Shared slot for one key
struct Entry<V> {
    value: OnceCell<V>,
    /// Position in the recency list. Only touched with the list lock held.
    node: Mutex<Option<NodeId>>,
}

impl<V> Entry<V> {
    fn pending() -> Self {
        Self {
            value: OnceCell::new(),
            node: Mutex::new(None),
        }
    }

    fn loaded(value: V) -> Self {
        Self {
            value: OnceCell::with_value(value),
            node: Mutex::new(None),
        }
    }
}

/// Recency bookkeeping of a bounded cache
struct Eviction<K, V> {
    max: NonZeroUsize,
    list: Mutex<LinkedList<K, Arc<Entry<V>>>>,
}

/// Thread-safe load-through cache with optional LRU eviction
pub struct Cache<K, V> {
    entries: DashMap<K, Arc<Entry<V>>, RandomState>,
    /// `None` when the cache is unbounded
    eviction: Option<Eviction<K, V>>,
    config: CacheConfig,
    loader: Option<Arc<dyn CacheLoader<K, V>>>,
    counters: CacheCounters,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(config: CacheConfig, loader: Option<Arc<dyn CacheLoader<K, V>>>) -> Self {
        let eviction = config.capacity().map(|max| Eviction {
            max,
            list: Mutex::new(LinkedList::new()),
        });
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            eviction,
            config,
            loader,
            counters: CacheCounters::default(),
        }
    }

    /// Get the value for `key`, computing it with the default loader on a miss.
    ///
    /// Fails with [`CacheError::MissingLoader`] if the key is not cached and the
    /// cache was built without a loader.
    pub fn get(&self, key: &K) -> Result<V> {
        match &self.loader {
            Some(loader) => self.fetch(key, |key| Ok(loader.load(key)?)),
            None => self.fetch(key, |_| Err(CacheError::MissingLoader)),
        }
    }

    /// Get the value for `key`, computing it with `loader` on a miss.
    ///
    /// `loader` replaces the default loader for this call only and is not
    /// invoked on a hit.
    pub fn get_with<F>(&self, key: &K, loader: F) -> Result<V>
    where
        F: FnOnce(&K) -> anyhow::Result<V>,
    {
        self.fetch(key, |key| Ok(loader(key)?))
    }

    /// Take a snapshot of the cache size and counters
    pub fn stats(&self) -> CacheStats {
        match &self.eviction {
            Some(eviction) => {
                let list = eviction.list.lock();
                CacheStats::new(list.len(), self.config.max_size, &self.counters)
            }
            None => {
                // pending slots hold no value yet and are not entries
                let loaded = self
                    .entries
                    .iter()
                    .filter(|entry| entry.value().value.get().is_some())
                    .count();
                CacheStats::new(loaded, self.config.max_size, &self.counters)
            }
        }
    }

    /// Get current number of entries
    pub fn len(&self) -> usize {
        self.stats().current_size()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured bound, zero or negative when unbounded
    pub fn max_size(&self) -> i64 {
        self.config.max_size
    }

    /// Check if the cache evicts least recently used entries
    pub fn is_bounded(&self) -> bool {
        self.eviction.is_some()
    }

    /// Check if the cache was built with a default loader
    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fork this cache.
    ///
    /// The copy shares the default loader and starts with the resident entries
    /// in the same recency order, but has its own map, list and counters.
    /// A bounded copy keeps at most `max_size` of the most recent entries.
    pub fn copy(&self) -> Result<Self> {
        let copy = Self::new(self.config, self.loader.clone());

        // most recent first
        let resident: Vec<(K, V)> = match &self.eviction {
            Some(eviction) => {
                let list = eviction.list.lock();
                let mut seen = AHashSet::with_capacity(list.len());
                list.iter()
                    .filter(|(_, key, _)| seen.insert(*key))
                    .filter_map(|(_, key, entry)| {
                        entry.value.get().map(|value| (key.clone(), value.clone()))
                    })
                    .take(eviction.max.get())
                    .collect()
            }
            None => self
                .entries
                .iter()
                .filter_map(|entry| {
                    let key = entry.key();
                    entry.value().value.get().map(|value| (key.clone(), value.clone()))
                })
                .collect(),
        };

        for (key, value) in resident.into_iter().rev() {
            copy.insert_loaded(key, value)?;
        }
        Ok(copy)
    }

    fn fetch<F>(&self, key: &K, load: F) -> Result<V>
    where
        F: FnOnce(&K) -> Result<V>,
    {
        let entry = self.entry_for(key);

        let mut loaded = false;
        let result = entry
            .value
            .get_or_try_init(|| {
                loaded = true;
                load(key)
            })
            .map(V::clone);

        let value = match result {
            Ok(value) => value,
            Err(err) => {
                self.abandon(key, &entry, &err);
                return Err(err);
            }
        };

        if loaded {
            self.counters.record_miss();
            trace!("Loaded cache entry");
        } else {
            self.counters.record_hit();
        }

        // A failed load by another caller may have unmapped the slot while this
        // caller was loading into it. Such a value is returned but not tracked.
        if !loaded || self.is_mapped(key, &entry) {
            self.promote(key, &entry)?;
        }
        self.trim();
        Ok(value)
    }

    /// Look up the slot for `key`, inserting an empty one on a miss
    fn entry_for(&self, key: &K) -> Arc<Entry<V>> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }
        Arc::clone(
            self.entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Entry::pending()))
                .value(),
        )
    }

    fn is_mapped(&self, key: &K, entry: &Arc<Entry<V>>) -> bool {
        self.entries
            .get(key)
            .map_or(false, |mapped| Arc::ptr_eq(mapped.value(), entry))
    }

    /// Forget a slot whose load failed so the next caller retries
    fn abandon(&self, key: &K, entry: &Arc<Entry<V>>, err: &CacheError) {
        self.counters.record_miss();
        if let CacheError::Load(_) = err {
            self.counters.record_load_failure();
        }
        self.entries.remove_if(key, |_, mapped| {
            Arc::ptr_eq(mapped, entry) && mapped.value.get().is_none()
        });
        debug!("Cache load failed: {}", err);
    }

    /// Move the slot to the head of the recency list.
    ///
    /// A slot whose node was already evicted gets a fresh node, which brings
    /// it back even if the evicting trim is about to unmap it. Such a node
    /// drifts to the tail and is trimmed again.
    fn promote(&self, key: &K, entry: &Arc<Entry<V>>) -> Result<()> {
        let Some(eviction) = &self.eviction else {
            return Ok(());
        };

        let mut list = eviction.list.lock();
        let mut node = entry.node.lock();
        let id = match *node {
            Some(id) if list.contains(id) => {
                list.remove_node(id);
                id
            }
            _ => {
                let id = list.create_node(key.clone(), Arc::clone(entry));
                *node = Some(id);
                id
            }
        };
        list.add_head(id)?;
        trace!("Promoted {} to head", id);
        Ok(())
    }

    /// Evict least recently used slots until the list is within bounds
    fn trim(&self) {
        let Some(eviction) = &self.eviction else {
            return;
        };

        let evicted: Vec<(K, Arc<Entry<V>>)> = {
            let mut list = eviction.list.lock();
            let mut evicted = Vec::new();
            while list.len() > eviction.max.get() {
                let Some(id) = list.remove_tail() else {
                    break;
                };
                evicted.extend(list.release(id));
            }
            evicted
        };

        if evicted.is_empty() {
            return;
        }

        // list lock released: the map may be touched now
        for (key, entry) in &evicted {
            self.entries
                .remove_if(key, |_, mapped| Arc::ptr_eq(mapped, entry));
        }
        self.counters.record_evictions(evicted.len() as u64);
        debug!(
            "Evicted {} cache entries (max size {})",
            evicted.len(),
            eviction.max
        );
    }

    /// Add an already computed value as the most recently used entry.
    /// Only used while building a copy, before it is shared.
    fn insert_loaded(&self, key: K, value: V) -> Result<()> {
        let entry = Arc::new(Entry::loaded(value));
        if let Some(eviction) = &self.eviction {
            let mut list = eviction.list.lock();
            let id = list.create_node(key.clone(), Arc::clone(&entry));
            list.add_head(id)?;
            *entry.node.lock() = Some(id);
        }
        self.entries.insert(key, entry);
        Ok(())
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("max_size", &self.config.max_size)
            .field("current_entries", &self.len())
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}
