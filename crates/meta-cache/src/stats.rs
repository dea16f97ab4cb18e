//! Cache statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a cache.
///
/// `current_size` and `max_size` of a bounded cache are read under the same
/// lock that guards eviction, so a snapshot never shows a half-finished trim.
/// The counters are cumulative since the cache was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    current_size: usize,
    max_size: i64,
    hits: u64,
    misses: u64,
    evictions: u64,
    load_failures: u64,
}

impl CacheStats {
    pub(crate) fn new(current_size: usize, max_size: i64, counters: &CacheCounters) -> Self {
        Self {
            current_size,
            max_size,
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
            load_failures: counters.load_failures.load(Ordering::Relaxed),
        }
    }

    /// Number of resident entries
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Configured bound, zero or negative when unbounded
    pub fn max_size(&self) -> i64 {
        self.max_size
    }

    /// Get hit count
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Get miss count
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Get eviction count
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Get failed load count
    pub fn load_failures(&self) -> u64 {
        self.load_failures
    }

    /// Get total requests (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Calculate hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Live counters shared by all threads using a cache
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    load_failures: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reads_counters() {
        let counters = CacheCounters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_evictions(3);
        counters.record_load_failure();

        let stats = CacheStats::new(7, 10, &counters);
        assert_eq!(stats.current_size(), 7);
        assert_eq!(stats.max_size(), 10);
        assert_eq!(stats.hits(), 2);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.evictions(), 3);
        assert_eq!(stats.load_failures(), 1);
        assert_eq!(stats.total_requests(), 3);
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let counters = CacheCounters::default();
        let before = CacheStats::new(0, 0, &counters);

        counters.record_miss();
        let after = CacheStats::new(1, 0, &counters);

        assert_eq!(before.misses(), 0);
        assert_eq!(after.misses(), 1);
        assert_ne!(before, after);
    }

    #[test]
    fn test_hit_rate() {
        let counters = CacheCounters::default();
        assert_eq!(CacheStats::new(0, 0, &counters).hit_rate(), 0.0);

        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_miss();

        let stats = CacheStats::new(2, 0, &counters);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serialize() {
        let stats = CacheStats::new(1, 5, &CacheCounters::default());
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["current_size"], 1);
        assert_eq!(json["max_size"], 5);
        assert_eq!(json["evictions"], 0);
    }
}
