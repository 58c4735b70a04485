//! Key-prefix invalidation.
//!
//! Invalidation marks entries stale rather than deleting them: observers
//! keep seeing the old value until the refetch lands.

use std::fmt;

use stash_core::QueryKey;
use tracing::{debug, info};

use crate::client::QueryClient;
use crate::entry::QueryStatus;

/// Selects cache entries by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Every entry.
    All,
    /// Entries whose key begins with the given prefix.
    Prefix(QueryKey),
    /// The entry with exactly this key.
    Exact(QueryKey),
    /// Entries whose key begins with any of the prefixes. An empty list matches nothing.
    AnyPrefix(Vec<QueryKey>),
}

impl QueryFilter {
    pub fn prefix(key: impl Into<QueryKey>) -> Self {
        Self::Prefix(key.into())
    }

    pub fn exact(key: impl Into<QueryKey>) -> Self {
        Self::Exact(key.into())
    }

    /// Builds the filter for a mutation's invalidation set. `None` means
    /// the mutation declared no set and invalidates everything.
    pub fn from_invalidates(invalidates: Option<&[QueryKey]>) -> Self {
        match invalidates {
            None => Self::All,
            Some([key]) => Self::Prefix(key.clone()),
            Some(keys) => Self::AnyPrefix(keys.to_vec()),
        }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::All => true,
            Self::Prefix(prefix) => key.starts_with(prefix),
            Self::Exact(exact) => key == exact,
            Self::AnyPrefix(prefixes) => prefixes.iter().any(|prefix| key.starts_with(prefix)),
        }
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Prefix(prefix) => write!(f, "{}/*", prefix),
            Self::Exact(key) => write!(f, "{}", key),
            Self::AnyPrefix(prefixes) => {
                let rendered: Vec<_> = prefixes.iter().map(|p| format!("{}/*", p)).collect();
                write!(f, "[{}]", rendered.join(", "))
            },
        }
    }
}

/// Outcome of an invalidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationResult {
    /// Keys marked stale, sorted.
    pub keys: Vec<QueryKey>,
    /// How many of them started a background refetch.
    pub refetching: usize,
}

impl InvalidationResult {
    pub fn count(&self) -> usize {
        self.keys.len()
    }
}

impl QueryClient {
    /// Marks every entry matching `filter` stale.
    ///
    /// Observed entries refetch in the background. An entry with a fetch
    /// already in flight refetches once that fetch settles, so its
    /// pre-invalidation result is never reported as fresh.
    pub fn invalidate_queries(&self, filter: &QueryFilter) -> InvalidationResult {
        let mut result = InvalidationResult::default();
        {
            let mut entries = self.inner.entries.lock();
            for (key, entry) in entries.iter_mut() {
                if !filter.matches(key) {
                    continue;
                }
                result.keys.push(key.clone());

                if entry.in_flight.is_some() {
                    entry.refetch_pending = true;
                    debug!(key = %key, "Invalidated mid-fetch, refetch deferred");
                    continue;
                }

                entry.status = QueryStatus::Stale;
                if entry.observers > 0 && self.start_fetch(key, entry).is_some() {
                    result.refetching += 1;
                } else {
                    entry.notify();
                }
            }
        }
        result.keys.sort();

        self.inner.metrics.record_invalidations(result.count());
        info!(
            filter = %filter,
            count = result.count(),
            refetching = result.refetching,
            "Cache entries invalidated"
        );
        result
    }
}
