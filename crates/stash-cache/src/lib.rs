//! Stash Cache - Query cache and invalidation coordinator
//!
//! This crate owns every cached value. Consumers describe reads as
//! [`Query`] definitions and writes as [`Mutation`] definitions; the
//! [`QueryClient`] deduplicates concurrent fetches, tracks freshness,
//! retries transient failures, and invalidates entries by key prefix
//! after successful writes.
//!
//! ## Lifecycle of an entry
//!
//! ```text
//! Absent -> Fetching -> Fresh -> Stale -> Fetching -> ...
//!              \-> Error
//! ```
//!
//! Entries nobody observes are evicted by [`QueryClient::collect_garbage`]
//! once their gc time has elapsed.

pub mod client;
pub mod config;
pub mod entry;
pub mod gc;
pub mod invalidation;
pub mod metrics;
pub mod mutation;
pub mod notify;
pub mod observer;
pub mod optimistic;
pub mod query;

pub use client::QueryClient;
pub use config::{CacheConfig, QueryOptions};
pub use entry::{QueryResult, QueryStatus};
pub use gc::GcHandle;
pub use invalidation::{InvalidationResult, QueryFilter};
pub use metrics::{CacheMetrics, register_cache_metrics};
pub use mutation::{MUTATION_FAILED, Mutation};
pub use notify::{MemoryNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use observer::QueryObserver;
pub use optimistic::OptimisticUpdate;
pub use query::Query;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }
}
