//! The query client: sole owner of every cache entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::FutureExt;
use parking_lot::Mutex;
use stash_core::{QueryKey, Result, StashError};
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, QueryOptions, ResolvedOptions};
use crate::entry::{Entry, QueryResult, QueryStatus};
use crate::invalidation::QueryFilter;
use crate::metrics::CacheMetrics;
use crate::notify::{Notifier, TracingNotifier};
use crate::query::{ErasedValue, FetchFn, FetchOutcome, InFlight, Query, downcast};

pub(crate) struct ClientInner {
    pub entries: Mutex<HashMap<QueryKey, Entry>>,
    pub config: CacheConfig,
    pub metrics: CacheMetrics,
    pub notifier: Arc<dyn Notifier>,
    next_id: AtomicU64,
}

/// Cache coordinator.
///
/// Entries are keyed by [`QueryKey`] and owned exclusively by the client;
/// consumers only ever receive `Arc<T>` read handles. Cloning the client
/// is cheap and every clone shares the same store.
///
/// The entry map is guarded by a single lock that is never held across
/// an `.await`, so every state transition is serialized. Fetches run as
/// spawned tasks: they finish and update the cache even if every caller
/// waiting on them has gone away. Methods that start fetches must be
/// called from within a Tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use stash_cache::{CacheConfig, Query, QueryClient};
/// use stash_core::KeyFactory;
///
/// # #[tokio::main]
/// # async fn main() -> stash_core::Result<()> {
/// let client = QueryClient::new(CacheConfig::default());
/// let keys = KeyFactory::new("todos");
/// let query = Query::new(keys.detail(5), || async { Ok("Buy milk".to_string()) });
///
/// let first = client.fetch_query(&query).await?; // fetches
/// let second = client.fetch_query(&query).await?; // served from cache
/// assert_eq!(first, second);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl QueryClient {
    /// Creates a client that reports notifications through tracing.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_notifier(config, Arc::new(TracingNotifier))
    }

    /// Creates a client with the given notification sink.
    pub fn with_notifier(config: CacheConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                entries: Mutex::new(HashMap::new()),
                config,
                metrics: CacheMetrics::new(),
                notifier,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    /// Returns the value for `query`, fetching it unless a fresh one is cached.
    ///
    /// Concurrent calls for the same key share one in-flight fetch.
    pub async fn fetch_query<T: Send + Sync + 'static>(&self, query: &Query<T>) -> Result<Arc<T>> {
        let in_flight = {
            let mut entries = self.inner.entries.lock();
            let now = Instant::now();
            let entry = self.adopt(&mut entries, query, now);

            if let Some(value) = entry.fresh_value(now) {
                self.inner.metrics.record_hit();
                debug!(key = %query.key(), "Cache hit");
                return downcast(query.key(), value);
            }

            self.inner.metrics.record_miss();
            debug!(
                key = %query.key(),
                joining = entry.in_flight.is_some(),
                "Cache miss"
            );
            self.start_fetch(query.key(), entry)
        };

        let value = in_flight
            .ok_or_else(|| StashError::internal("entry has no fetch procedure"))?
            .await?;
        downcast(query.key(), value)
    }

    /// Returns any cached value for `query`, even a stale one, and only
    /// fetches when nothing is cached. Route loaders use this.
    pub async fn ensure_query_data<T: Send + Sync + 'static>(
        &self,
        query: &Query<T>,
    ) -> Result<Arc<T>> {
        let in_flight = {
            let mut entries = self.inner.entries.lock();
            let now = Instant::now();
            let entry = self.adopt(&mut entries, query, now);

            if let Some(value) = entry.value.clone() {
                self.inner.metrics.record_hit();
                return downcast(query.key(), value);
            }

            self.inner.metrics.record_miss();
            self.start_fetch(query.key(), entry)
        };

        let value = in_flight
            .ok_or_else(|| StashError::internal("entry has no fetch procedure"))?
            .await?;
        downcast(query.key(), value)
    }

    /// Starts a background fetch for `query` unless a fresh value is cached.
    ///
    /// Does not wait for the result; a failure lands in the entry's
    /// `Error` state where readers and observers see it.
    pub fn prefetch_query<T: Send + Sync + 'static>(&self, query: &Query<T>) {
        let mut entries = self.inner.entries.lock();
        let now = Instant::now();
        let entry = self.adopt(&mut entries, query, now);

        if entry.needs_fetch(now) {
            debug!(key = %query.key(), "Prefetching");
            self.start_fetch(query.key(), entry);
        }
    }

    /// Returns the cached value under `key` without fetching, fresh or not.
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let mut entries = self.inner.entries.lock();
        let entry = entries.get_mut(key)?;
        entry.last_used = Instant::now();
        entry.value.clone()?.downcast::<T>().ok()
    }

    /// Stores `value` under `key` as fresh data.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut entries = self.inner.entries.lock();
        let now = Instant::now();
        let options = self.resolve(QueryOptions::default());
        let entry = entries
            .entry(key)
            .or_insert_with(|| Entry::new(self.next_id(), options, now));

        entry.value = Some(Arc::clone(&value) as ErasedValue);
        entry.status = QueryStatus::Fresh;
        entry.error = None;
        entry.updated_at = Some(now);
        entry.last_used = now;
        entry.notify();

        self.inner.metrics.update_entry_count(entries.len());
        value
    }

    /// Returns `{data, status, error}` for `key`.
    pub fn query_state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryResult<T> {
        self.snapshot(key, None)
    }

    /// Returns the current status of `key`.
    pub fn query_status(&self, key: &QueryKey) -> QueryStatus {
        self.inner
            .entries
            .lock()
            .get(key)
            .map(|entry| entry.status_at(Instant::now()))
            .unwrap_or(QueryStatus::Absent)
    }

    /// Removes every entry matching `filter`. Observers of a removed
    /// entry are woken and see it as absent.
    pub fn remove_queries(&self, filter: &QueryFilter) -> usize {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|key, entry| {
            let remove = filter.matches(key);
            if remove {
                entry.notify();
            }
            !remove
        });
        let removed = before - entries.len();

        if removed > 0 {
            self.inner.metrics.record_eviction("removed", removed);
            self.inner.metrics.update_entry_count(entries.len());
            info!(filter = %filter, count = removed, "Cache entries removed");
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) -> usize {
        self.remove_queries(&QueryFilter::All)
    }

    /// Retorna el numero de entries en cache.
    pub fn entry_count(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns every cached key, sorted.
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<_> = self.inner.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Unique ids for entries and optimistic updates.
    pub(crate) fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn resolve(&self, options: QueryOptions) -> ResolvedOptions {
        options.resolve(&self.inner.config)
    }

    /// Returns the entry for `query`, creating it if needed, and records
    /// the query's fetch procedure and options on it.
    pub(crate) fn adopt<'a, T>(
        &self,
        entries: &'a mut HashMap<QueryKey, Entry>,
        query: &Query<T>,
        now: Instant,
    ) -> &'a mut Entry {
        let options = self.resolve(*query.options());
        if !entries.contains_key(query.key()) {
            self.inner.metrics.update_entry_count(entries.len() + 1);
        }

        let entry = entries
            .entry(query.key().clone())
            .or_insert_with(|| Entry::new(self.next_id(), options, now));
        entry.options = options;
        entry.fetcher = Some(query.fetcher());
        entry.last_used = now;
        entry
    }

    /// Starts fetching `entry`, or joins the fetch already in flight.
    ///
    /// Returns `None` only if the entry has never been given a fetch procedure.
    pub(crate) fn start_fetch(&self, key: &QueryKey, entry: &mut Entry) -> Option<InFlight> {
        if let Some(in_flight) = &entry.in_flight {
            return Some(in_flight.clone());
        }
        let fetcher = entry.fetcher.clone()?;

        entry.status = QueryStatus::Fetching;
        entry.refetch_pending = false;

        let task = tokio::spawn(run_fetch(
            Arc::clone(&self.inner),
            key.clone(),
            entry.id,
            fetcher,
            entry.options.retry,
        ));
        let in_flight: InFlight = async move {
            task.await
                .unwrap_or_else(|err| Err(StashError::internal(format!("fetch task failed: {}", err))))
        }
        .boxed()
        .shared();

        entry.in_flight = Some(in_flight.clone());
        entry.notify();
        Some(in_flight)
    }

    /// Records the outcome of a finished fetch on its entry.
    fn settle_fetch(&self, key: &QueryKey, entry_id: u64, outcome: &FetchOutcome) {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.get_mut(key).filter(|entry| entry.id == entry_id) else {
            debug!(key = %key, "Entry removed while fetching, discarding result");
            return;
        };

        let now = Instant::now();
        entry.in_flight = None;
        entry.last_used = now;

        match outcome {
            Ok(value) => {
                entry.value = Some(Arc::clone(value));
                entry.status = QueryStatus::Fresh;
                entry.error = None;
                entry.updated_at = Some(now);
            },
            Err(err) => {
                entry.status = QueryStatus::Error;
                entry.error = Some(err.clone());
            },
        }

        if entry.refetch_pending {
            // Invalidated mid-flight: the result predates the invalidation.
            entry.refetch_pending = false;
            entry.status = QueryStatus::Stale;
            if entry.observers > 0 {
                debug!(key = %key, "Refetching entry invalidated during fetch");
                self.start_fetch(key, entry);
            }
        }

        entry.notify();
    }

    /// Builds the consumer view of `key`. With `entry_id`, an entry that
    /// was removed and re-created under the same key reads as absent.
    pub(crate) fn snapshot<T: Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        entry_id: Option<u64>,
    ) -> QueryResult<T> {
        let entries = self.inner.entries.lock();
        let Some(entry) = entries
            .get(key)
            .filter(|entry| entry_id.is_none_or(|id| entry.id == id))
        else {
            return QueryResult::absent();
        };

        let (data, mismatch) = match entry.value.clone().map(|value| downcast::<T>(key, value)) {
            Some(Ok(data)) => (Some(data), None),
            Some(Err(err)) => (None, Some(err)),
            None => (None, None),
        };

        QueryResult {
            data,
            status: entry.status_at(Instant::now()),
            error: mismatch.or_else(|| entry.error.clone()),
            updated_at: entry.updated_at,
        }
    }

    pub(crate) fn release_observer(&self, key: &QueryKey, entry_id: u64) {
        let mut entries = self.inner.entries.lock();
        if let Some(entry) = entries.get_mut(key).filter(|entry| entry.id == entry_id) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.last_used = Instant::now();
        }
    }
}

/// Runs one fetch with the retry budget, then settles the entry.
async fn run_fetch(
    inner: Arc<ClientInner>,
    key: QueryKey,
    entry_id: u64,
    fetcher: FetchFn,
    retry: u32,
) -> FetchOutcome {
    let started = Instant::now();
    let mut attempt = 0;

    let outcome = loop {
        match fetcher().await {
            Ok(value) => break Ok(value),
            Err(err) if attempt < retry && err.is_transient() => {
                let delay = inner.config.retry_delay_for(attempt);
                attempt += 1;
                warn!(
                    key = %key,
                    attempt,
                    error = %err,
                    delay = ?delay,
                    "Fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            },
            Err(err) => break Err(err),
        }
    };

    match &outcome {
        Ok(_) => {
            inner.metrics.record_fetch("success", started.elapsed());
            debug!(key = %key, elapsed = ?started.elapsed(), "Fetch complete");
        },
        Err(err) => {
            inner.metrics.record_fetch("error", started.elapsed());
            warn!(key = %key, attempts = attempt + 1, error = %err, "Fetch failed");
        },
    }

    QueryClient { inner }.settle_fetch(&key, entry_id, &outcome);
    outcome
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.entry_count())
            .field("config", &self.inner.config)
            .finish()
    }
}
