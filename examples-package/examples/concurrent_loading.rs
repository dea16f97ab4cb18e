//! Concurrent Loading Example
//!
//! Many threads asking for the same missing key trigger a single load.

use anyhow::Result;
use meta_cache::CacheBuilder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meta_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Concurrent Loading Example ===\n");

    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let cache = Arc::new(CacheBuilder::new().max_size(32).build_with_loader(
        move |type_name: &String| -> Result<usize> {
            counter.fetch_add(1, Ordering::SeqCst);
            // simulate an expensive reflective lookup
            thread::sleep(Duration::from_millis(100));
            Ok(type_name.len())
        },
    ));

    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get(&"com.example.UserMapper".to_string())
            })
        })
        .collect();

    for handle in handles {
        let width = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked"))??;
        tracing::info!("Worker got {}", width);
    }

    println!("{} threads, {} load(s)", threads, loads.load(Ordering::SeqCst));
    println!("{:?}", cache);

    // a forked cache keeps the entries but counts on its own
    let fork = cache.copy()?;
    fork.get(&"com.example.OrderMapper".to_string())?;
    println!("Original: {} entries, fork: {} entries", cache.len(), fork.len());

    Ok(())
}
