//! Typed query definitions.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use stash_core::{QueryKey, Result, StashError};

use crate::config::QueryOptions;

/// Type-erased cached value.
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;
pub(crate) type FetchOutcome = std::result::Result<ErasedValue, StashError>;
pub(crate) type FetchFn = Arc<dyn Fn() -> BoxFuture<'static, FetchOutcome> + Send + Sync>;
pub(crate) type InFlight = Shared<BoxFuture<'static, FetchOutcome>>;

/// Recovers the typed value stored under `key`.
pub(crate) fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: ErasedValue) -> Result<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| StashError::type_mismatch(key))
}

/// A key paired with the procedure that fetches its value.
///
/// Fetch procedures must be idempotent: the cache may call them again
/// on retry, refetch or invalidation, and coalesces concurrent reads of
/// the same key into a single call.
///
/// # Examples
///
/// ```
/// use stash_cache::Query;
/// use stash_core::KeyFactory;
/// use std::time::Duration;
///
/// let keys = KeyFactory::new("meals");
/// let query = Query::new(keys.detail("52874"), || async { Ok("Beef and Mustard Pie".to_string()) })
///     .stale_time(Duration::from_secs(15 * 60));
///
/// assert_eq!(query.key().to_string(), "meals/detail/52874");
/// ```
pub struct Query<T> {
    key: QueryKey,
    fetch: FetchFn,
    options: QueryOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Query<T> {
    /// Creates a query for `key` backed by `fetch`.
    pub fn new<F, Fut>(key: QueryKey, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let fetch: FetchFn = Arc::new(move || {
            let fut = fetch();
            async move { fut.await.map(|value| Arc::new(value) as ErasedValue) }.boxed()
        });

        Self {
            key,
            fetch,
            options: QueryOptions::default(),
            _marker: PhantomData,
        }
    }
}

impl<T> Query<T> {
    /// Overrides how long a fetched value stays fresh.
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.options.stale_time = Some(stale_time);
        self
    }

    /// Overrides how long an unobserved entry is retained.
    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.options.gc_time = Some(gc_time);
        self
    }

    /// Overrides the retry budget of failed fetches.
    pub fn retry(mut self, retry: u32) -> Self {
        self.options.retry = Some(retry);
        self
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub(crate) fn fetcher(&self) -> FetchFn {
        Arc::clone(&self.fetch)
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            fetch: Arc::clone(&self.fetch),
            options: self.options,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key.to_string())
            .field("options", &self.options)
            .finish()
    }
}
