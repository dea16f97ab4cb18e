//! Bounded concurrent cache for library metadata
//!
//! This crate provides the load-through cache used for metadata lookups such as
//! reflective type information, parsed statement metadata and type mappings.
//!
//! # Features
//!
//! - **Load-through**: values are computed by a loader on a miss, at most once per
//!   key even when many threads miss concurrently
//! - **LRU Eviction**: a bounded cache drops its least recently used entries
//! - **Unbounded mode**: a max size of zero or less disables eviction entirely
//! - **Failures are not cached**: a failed load leaves no entry behind
//! - **Statistics**: size, bound, hits, misses, evictions and load failures
//!
//! # Example
//!
//! ```
//! use meta_cache::CacheBuilder;
//!
//! let cache = CacheBuilder::new()
//!     .max_size(100)
//!     .build_with_loader(|sql: &String| -> anyhow::Result<usize> {
//!         Ok(sql.matches('?').count())
//!     });
//!
//! let params = cache.get(&"SELECT * FROM users WHERE id = ?".to_string())?;
//! assert_eq!(params, 1);
//! assert_eq!(cache.stats().current_size(), 1);
//! # Ok::<(), meta_cache::CacheError>(())
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod list;
pub mod loader;
pub mod stats;

pub use builder::CacheBuilder;
pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use list::{LinkedList, NodeId};
pub use loader::CacheLoader;
pub use stats::CacheStats;
