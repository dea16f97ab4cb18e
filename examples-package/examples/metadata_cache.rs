//! Metadata Caching Example
//!
//! Demonstrates load-through caching, LRU eviction and statistics.

use anyhow::Result;
use meta_cache::{CacheBuilder, CacheConfig, CacheError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meta_cache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Metadata Caching Example ===\n");

    // Example 1: Load-through caching
    load_through()?;

    // Example 2: LRU eviction
    lru_eviction()?;

    // Example 3: Failed loads and statistics
    cache_statistics()?;

    println!("\n=== All caching examples completed! ===");
    Ok(())
}

/// Count the bind parameters of a statement, standing in for real parsing
fn parse_parameters(sql: &String) -> Result<Vec<String>> {
    anyhow::ensure!(!sql.trim().is_empty(), "empty statement");
    Ok(sql
        .split_whitespace()
        .filter(|token| token.starts_with(':'))
        .map(|token| token.trim_start_matches(':').to_string())
        .collect())
}

/// Example 1: values are computed once and then served from the cache
fn load_through() -> Result<()> {
    println!("--- Example 1: Load-through Caching ---\n");

    let cache = CacheBuilder::new().build_with_loader(parse_parameters);
    println!("Cache created with max size {}\n", cache.max_size());

    let sql = "SELECT * FROM users WHERE id = :id AND active = :active".to_string();
    let params = cache.get(&sql)?;
    println!("Parsed {:?}", params);

    let again = cache.get(&sql)?;
    println!("Second lookup returned {:?} without parsing", again);

    let stats = cache.stats();
    println!("  Hits: {}, Misses: {}", stats.hits(), stats.misses());

    Ok(())
}

/// Example 2: a bounded cache drops the least recently used statement
fn lru_eviction() -> Result<()> {
    println!("\n--- Example 2: LRU Eviction ---\n");

    let config = CacheConfig::default().with_max_size(2);
    let cache = CacheBuilder::from_config(config).build_with_loader(parse_parameters);

    let statements = [
        "SELECT name FROM users WHERE id = :id",
        "DELETE FROM sessions WHERE user_id = :user",
        "UPDATE users SET name = :name WHERE id = :id",
    ];

    for sql in &statements {
        cache.get(&sql.to_string())?;
        println!("Loaded: {}", sql);
        println!("  Entries: {}", cache.len());
    }

    let stats = cache.stats();
    println!("\nEvictions: {}", stats.evictions());

    Ok(())
}

/// Example 3: failed loads are reported and never cached
fn cache_statistics() -> Result<()> {
    println!("\n--- Example 3: Cache Statistics ---\n");

    let cache = CacheBuilder::new().max_size(8).build_with_loader(parse_parameters);

    for i in 0..10 {
        let sql = format!("SELECT {} FROM t WHERE k = :k", i % 4);
        cache.get(&sql)?;
    }
    println!("Performed 10 lookups over 4 statements");

    match cache.get(&"   ".to_string()) {
        Err(CacheError::Load(err)) => println!("Load failed as expected: {}", err),
        other => println!("Unexpected result: {:?}", other),
    }

    let stats = cache.stats();
    println!("\nCache Statistics:");
    println!("  Hits:          {}", stats.hits());
    println!("  Misses:        {}", stats.misses());
    println!("  Hit Rate:      {:.1}%", stats.hit_rate() * 100.0);
    println!("  Load failures: {}", stats.load_failures());
    println!("  Entries:       {}/{}", stats.current_size(), stats.max_size());

    Ok(())
}
