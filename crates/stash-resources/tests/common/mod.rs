#![allow(dead_code)]
use std::sync::Arc;
use std::time::Duration;

use stash_cache::{CacheConfig, MemoryNotifier, QueryClient};
use stash_resources::{MemoryTodoStore, TodoMutations, TodoQueries};

/// A client with no retry delay that records notifications.
pub fn client() -> (QueryClient, Arc<MemoryNotifier>) {
    let config = CacheConfig {
        retry_delay: Duration::ZERO,
        max_retry_delay: Duration::ZERO,
        ..CacheConfig::default()
    };
    let notifier = Arc::new(MemoryNotifier::new());
    (QueryClient::with_notifier(config, notifier.clone()), notifier)
}

/// Todo definitions over a shared in-memory store with `count` todos.
pub fn todo_fixture(count: i64) -> (Arc<MemoryTodoStore>, TodoQueries, TodoMutations) {
    let store = Arc::new(MemoryTodoStore::seeded(count));
    let queries = TodoQueries::new(store.clone());
    let mutations = TodoMutations::new(store.clone());
    (store, queries, mutations)
}
