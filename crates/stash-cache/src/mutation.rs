//! Mutations: writes that invalidate cached reads.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use stash_core::{QueryKey, Result};
use tracing::{debug, warn};

use crate::client::QueryClient;
use crate::invalidation::{InvalidationResult, QueryFilter};
use crate::notify::Notification;

type ExecuteFn<V, R> = Arc<dyn Fn(V) -> BoxFuture<'static, Result<R>> + Send + Sync>;
type SuccessFn<R> = Arc<dyn Fn(&QueryClient, &R) + Send + Sync>;
type NotifyFn<R> = Arc<dyn Fn(&R) -> Notification + Send + Sync>;

/// Title of the notification emitted when a mutation fails.
pub const MUTATION_FAILED: &str = "Mutation failed";

/// A write operation and the cache keys it makes stale.
///
/// On success the client runs, in order: the mutation's own success
/// handler, the invalidation pass, then the success notification. On
/// failure nothing is invalidated and a single error notification is
/// emitted.
///
/// # Examples
///
/// ```
/// use stash_cache::{Mutation, Notification};
/// use stash_core::KeyFactory;
///
/// let todos = KeyFactory::new("todos");
/// let delete = Mutation::new("delete-todo", |id: i64| async move { Ok(id) })
///     .invalidates([todos.all()])
///     .notify_with(|id| Notification::success("Todo deleted", format!("Todo {} removed", id)));
///
/// assert_eq!(delete.name(), "delete-todo");
/// ```
pub struct Mutation<V, R> {
    name: String,
    execute: ExecuteFn<V, R>,
    invalidates: Option<Vec<QueryKey>>,
    on_success: Option<SuccessFn<R>>,
    notify: Option<NotifyFn<R>>,
    retry: Option<u32>,
}

impl<V: Send + 'static, R: Send + 'static> Mutation<V, R> {
    pub fn new<F, Fut>(name: impl Into<String>, execute: F) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        Self {
            name: name.into(),
            execute: Arc::new(move |vars| execute(vars).boxed()),
            invalidates: None,
            on_success: None,
            notify: None,
            retry: None,
        }
    }
}

impl<V, R> Mutation<V, R> {
    /// Declares the key prefixes made stale by this mutation. Without a
    /// declaration, a successful mutation invalidates the whole cache.
    pub fn invalidates(mut self, keys: impl IntoIterator<Item = QueryKey>) -> Self {
        self.invalidates = Some(keys.into_iter().collect());
        self
    }

    /// Runs before invalidation, while the cache still holds pre-mutation data.
    pub fn on_success(mut self, handler: impl Fn(&QueryClient, &R) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(handler));
        self
    }

    /// Builds the notification emitted after a successful invalidation.
    pub fn notify_with(mut self, notify: impl Fn(&R) -> Notification + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    /// Overrides the client's mutation retry budget.
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invalidation_filter(&self) -> QueryFilter {
        QueryFilter::from_invalidates(self.invalidates.as_deref())
    }
}

impl<V, R> Clone for Mutation<V, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            execute: Arc::clone(&self.execute),
            invalidates: self.invalidates.clone(),
            on_success: self.on_success.clone(),
            notify: self.notify.clone(),
            retry: self.retry,
        }
    }
}

impl<V, R> fmt::Debug for Mutation<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("name", &self.name)
            .field("invalidates", &self.invalidation_filter().to_string())
            .field("retry", &self.retry)
            .finish()
    }
}

impl QueryClient {
    /// Executes `mutation` with `variables`.
    pub async fn mutate<V, R>(&self, mutation: &Mutation<V, R>, variables: V) -> Result<R>
    where
        V: Clone + Send + 'static,
        R: Send + 'static,
    {
        match self.execute_mutation(mutation, variables).await {
            Ok(result) => {
                self.complete_mutation(mutation, &result);
                Ok(result)
            },
            Err(err) => {
                self.inner
                    .notifier
                    .notify(Notification::error(MUTATION_FAILED, err.to_string()));
                Err(err)
            },
        }
    }

    /// Runs the write itself, retrying transient failures.
    pub(crate) async fn execute_mutation<V, R>(
        &self,
        mutation: &Mutation<V, R>,
        variables: V,
    ) -> Result<R>
    where
        V: Clone + Send + 'static,
        R: Send + 'static,
    {
        let retry = mutation.retry.unwrap_or(self.inner.config.mutation_retry);
        let mut attempt = 0;

        loop {
            match (mutation.execute)(variables.clone()).await {
                Ok(result) => {
                    debug!(mutation = %mutation.name, attempts = attempt + 1, "Mutation succeeded");
                    return Ok(result);
                },
                Err(err) if attempt < retry && err.is_transient() => {
                    let delay = self.inner.config.retry_delay_for(attempt);
                    attempt += 1;
                    warn!(
                        mutation = %mutation.name,
                        attempt,
                        error = %err,
                        delay = ?delay,
                        "Mutation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(err) => {
                    warn!(mutation = %mutation.name, error = %err, "Mutation failed");
                    return Err(err);
                },
            }
        }
    }

    /// Success path: own handler, invalidation, then notification.
    pub(crate) fn complete_mutation<V, R>(
        &self,
        mutation: &Mutation<V, R>,
        result: &R,
    ) -> InvalidationResult {
        if let Some(handler) = &mutation.on_success {
            handler(self, result);
        }

        let invalidation = self.invalidate_queries(&mutation.invalidation_filter());

        if let Some(notify) = &mutation.notify {
            self.inner.notifier.notify(notify(result));
        }
        invalidation
    }
}
