#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use stash_cache::{CacheConfig, MemoryNotifier, Query, QueryClient};
use stash_core::{QueryKey, StashError};

/// Config with no delay between retries so failing fetches settle immediately.
pub fn test_config() -> CacheConfig {
    CacheConfig {
        retry_delay: Duration::ZERO,
        max_retry_delay: Duration::ZERO,
        ..CacheConfig::default()
    }
}

/// A client that records notifications in memory.
pub fn test_client() -> (QueryClient, Arc<MemoryNotifier>) {
    test_client_with(test_config())
}

pub fn test_client_with(config: CacheConfig) -> (QueryClient, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let client = QueryClient::with_notifier(config, notifier.clone());
    (client, notifier)
}

/// A query whose n-th fetch returns `"{label}-{n}"` after `delay`.
/// The returned counter tracks how many times the fetch ran.
pub fn counting_query(
    key: QueryKey,
    label: &str,
    delay: Duration,
) -> (Query<String>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let label = label.to_string();

    let query = Query::new(key, move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let label = label.clone();
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(format!("{}-{}", label, n))
        }
    });
    (query, calls)
}

/// A query that always fails with `error`.
pub fn failing_query(key: QueryKey, error: StashError) -> (Query<String>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let query = Query::new(key, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let error = error.clone();
        async move { Err(error) }
    });
    (query, calls)
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
