//! Subscriptions to a single key.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use stash_core::{QueryKey, Result, StashError};
use tokio::sync::watch;
use tracing::debug;

use crate::client::QueryClient;
use crate::entry::QueryResult;
use crate::query::{Query, downcast};

/// A live view of one cache entry.
///
/// While at least one observer exists the entry is never collected, and
/// invalidating it triggers a background refetch. Dropping the observer
/// releases the subscription.
pub struct QueryObserver<T> {
    client: QueryClient,
    key: QueryKey,
    entry_id: u64,
    revision: watch::Receiver<u64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current `{data, status, error}` of the entry.
    pub fn snapshot(&self) -> QueryResult<T> {
        self.client.snapshot(&self.key, Some(self.entry_id))
    }

    /// Waits until the entry changes.
    ///
    /// Fails with `NotCached` once the entry has been removed from the cache.
    pub async fn changed(&mut self) -> Result<()> {
        self.revision
            .changed()
            .await
            .map_err(|_| StashError::not_cached(&self.key))
    }

    /// Waits until no fetch is in flight and returns the settled state.
    pub async fn settled(&mut self) -> QueryResult<T> {
        loop {
            self.revision.borrow_and_update();
            let snapshot = self.snapshot();
            if !snapshot.is_fetching() {
                return snapshot;
            }
            if self.revision.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// Refetches the entry regardless of freshness, joining a fetch
    /// already in flight.
    pub async fn refetch(&self) -> Result<Arc<T>> {
        let in_flight = {
            let mut entries = self.client.inner.entries.lock();
            let entry = entries
                .get_mut(&self.key)
                .filter(|entry| entry.id == self.entry_id)
                .ok_or_else(|| StashError::not_cached(&self.key))?;
            self.client.start_fetch(&self.key, entry)
        };

        let value = in_flight
            .ok_or_else(|| StashError::not_cached(&self.key))?
            .await?;
        downcast(&self.key, value)
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.client.release_observer(&self.key, self.entry_id);
    }
}

impl QueryClient {
    /// Subscribes to `query`, fetching it in the background if no fresh
    /// value is cached.
    pub fn subscribe<T: Send + Sync + 'static>(&self, query: &Query<T>) -> QueryObserver<T> {
        let mut entries = self.inner.entries.lock();
        let now = Instant::now();
        let entry = self.adopt(&mut entries, query, now);

        entry.observers += 1;
        if entry.needs_fetch(now) {
            self.start_fetch(query.key(), entry);
        }
        debug!(key = %query.key(), observers = entry.observers, "Observer attached");

        QueryObserver {
            client: self.clone(),
            key: query.key().clone(),
            entry_id: entry.id,
            revision: entry.subscribe(),
            _marker: PhantomData,
        }
    }
}
