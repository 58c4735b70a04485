//! Cache entries and the state they expose to consumers.

use std::sync::Arc;
use std::time::Instant;

use stash_core::StashError;
use tokio::sync::watch;

use crate::config::ResolvedOptions;
use crate::optimistic::Patch;
use crate::query::{ErasedValue, FetchFn, InFlight};

/// Lifecycle state of one key.
///
/// ```text
/// Absent -> Fetching -> Fresh -> (stale time) Stale -> Fetching -> Fresh
///              |
///              +-> Error -> (read or invalidation) Fetching
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// No entry exists for the key.
    Absent,
    /// A fetch is in flight. Previously cached data stays readable.
    Fetching,
    /// The cached value is trusted.
    Fresh,
    /// The cached value must be refetched before it is trusted again.
    Stale,
    /// The last fetch failed after exhausting its retries.
    Error,
}

/// What a consumer sees for one key: `{data, status, error}`.
#[derive(Debug)]
pub struct QueryResult<T> {
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub error: Option<StashError>,
    pub updated_at: Option<Instant>,
}

impl<T> QueryResult<T> {
    pub(crate) fn absent() -> Self {
        Self {
            data: None,
            status: QueryStatus::Absent,
            error: None,
            updated_at: None,
        }
    }

    /// Fetching with nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Fetching && self.data.is_none()
    }

    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Fetching
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_fresh(&self) -> bool {
        self.status == QueryStatus::Fresh
    }
}

impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// One slot of the cache. Only the coordinator touches entries.
pub(crate) struct Entry {
    /// Unique per entry; distinguishes a re-created key from a removed one.
    pub id: u64,
    pub value: Option<ErasedValue>,
    pub status: QueryStatus,
    pub error: Option<StashError>,
    pub updated_at: Option<Instant>,
    pub last_used: Instant,
    pub observers: usize,
    pub options: ResolvedOptions,
    pub fetcher: Option<FetchFn>,
    pub in_flight: Option<InFlight>,
    /// Set when the entry is invalidated while a fetch is in flight.
    pub refetch_pending: bool,
    /// Optimistic patches not yet committed or compensated, oldest first.
    pub patches: Vec<Patch>,
    revision: watch::Sender<u64>,
}

impl Entry {
    pub fn new(id: u64, options: ResolvedOptions, now: Instant) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            id,
            value: None,
            status: QueryStatus::Fetching,
            error: None,
            updated_at: None,
            last_used: now,
            observers: 0,
            options,
            fetcher: None,
            in_flight: None,
            refetch_pending: false,
            patches: Vec::new(),
            revision,
        }
    }

    /// Status as of `now`: a fresh value past its stale time reads as stale.
    pub fn status_at(&self, now: Instant) -> QueryStatus {
        match (self.status, self.updated_at) {
            (QueryStatus::Fresh, Some(updated_at))
                if now.saturating_duration_since(updated_at) >= self.options.stale_time =>
            {
                QueryStatus::Stale
            },
            (status, _) => status,
        }
    }

    /// Returns the cached value if it can be served without a fetch.
    pub fn fresh_value(&self, now: Instant) -> Option<ErasedValue> {
        match self.status_at(now) {
            QueryStatus::Fresh => self.value.clone(),
            _ => None,
        }
    }

    pub fn needs_fetch(&self, now: Instant) -> bool {
        self.in_flight.is_none() && self.fresh_value(now).is_none()
    }

    /// Wakes every observer of this entry.
    pub fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn is_collectable(&self, now: Instant) -> bool {
        self.observers == 0
            && self.in_flight.is_none()
            && now.saturating_duration_since(self.last_used) >= self.options.gc_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options(stale_secs: u64) -> ResolvedOptions {
        ResolvedOptions {
            stale_time: Duration::from_secs(stale_secs),
            gc_time: Duration::from_secs(60),
            retry: 0,
        }
    }

    fn fresh_entry(now: Instant, stale_secs: u64) -> Entry {
        let mut entry = Entry::new(1, options(stale_secs), now);
        entry.value = Some(Arc::new(42u32) as ErasedValue);
        entry.status = QueryStatus::Fresh;
        entry.updated_at = Some(now);
        entry
    }

    #[test]
    fn test_fresh_entry_serves_value() {
        let now = Instant::now();
        let entry = fresh_entry(now, 60);

        assert_eq!(entry.status_at(now), QueryStatus::Fresh);
        assert!(entry.fresh_value(now).is_some());
        assert!(!entry.needs_fetch(now));
    }

    #[test]
    fn test_entry_goes_stale_after_stale_time() {
        let now = Instant::now();
        let entry = fresh_entry(now, 60);
        let later = now + Duration::from_secs(61);

        assert_eq!(entry.status_at(later), QueryStatus::Stale);
        assert!(entry.fresh_value(later).is_none());
        assert!(entry.needs_fetch(later));
    }

    #[test]
    fn test_zero_stale_time_is_always_stale() {
        let now = Instant::now();
        let entry = fresh_entry(now, 0);
        assert_eq!(entry.status_at(now), QueryStatus::Stale);
    }

    #[test]
    fn test_error_entry_needs_fetch() {
        let now = Instant::now();
        let mut entry = fresh_entry(now, 60);
        entry.status = QueryStatus::Error;

        assert!(entry.needs_fetch(now));
    }

    #[test]
    fn test_observed_entry_is_not_collectable() {
        let now = Instant::now();
        let mut entry = fresh_entry(now, 60);
        let later = now + Duration::from_secs(120);

        assert!(entry.is_collectable(later));
        entry.observers = 1;
        assert!(!entry.is_collectable(later));
    }

    #[test]
    fn test_notify_wakes_subscribers() {
        let entry = fresh_entry(Instant::now(), 60);
        let mut rx = entry.subscribe();

        entry.notify();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        assert!(!rx.has_changed().unwrap());
    }
}
