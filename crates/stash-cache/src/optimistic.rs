//! Optimistic updates with compensation.
//!
//! An [`OptimisticUpdate`] rewrites cached values before a write is
//! confirmed. It must then be committed or compensated; dropping it
//! uncommitted compensates. Compensation restores an entry only while it
//! still holds the optimistic value, so a refetch or `set_query_data`
//! that landed in between is never overwritten. Patches stacked on one
//! entry by overlapping updates unwind in any order back to the last
//! confirmed value.

use std::sync::Arc;

use stash_core::{QueryKey, Result};
use tracing::{debug, warn};

use crate::client::QueryClient;
use crate::invalidation::QueryFilter;
use crate::mutation::Mutation;
use crate::notify::Notification;
use crate::query::ErasedValue;

/// One optimistic rewrite, kept on the entry it rewrote until its owner
/// commits or compensates.
pub(crate) struct Patch {
    pub owner: u64,
    pub previous: ErasedValue,
    pub optimistic: ErasedValue,
}

/// Pending optimistic rewrite of one or more cache entries.
#[must_use = "an optimistic update is compensated when dropped"]
pub struct OptimisticUpdate {
    client: QueryClient,
    id: u64,
    /// Rewritten entries in apply order, as `(key, entry id)`.
    targets: Vec<(QueryKey, u64)>,
    settled: bool,
}

impl OptimisticUpdate {
    /// Rewrites every cached `T` matching `filter` with `updater`.
    ///
    /// Entries without a value, holding another type, or for which the
    /// updater returns `None` are left alone. Returns how many entries changed.
    pub fn apply<T, F>(&mut self, filter: &QueryFilter, updater: F) -> usize
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> Option<T>,
    {
        let mut entries = self.client.inner.entries.lock();
        let mut applied = 0;

        for (key, entry) in entries.iter_mut().filter(|(key, _)| filter.matches(key)) {
            let Some(current) = entry.value.clone() else {
                continue;
            };
            let Ok(typed) = Arc::clone(&current).downcast::<T>() else {
                continue;
            };
            let Some(next) = updater(&typed) else {
                continue;
            };

            let optimistic: ErasedValue = Arc::new(next);
            entry.value = Some(Arc::clone(&optimistic));
            entry.patches.push(Patch {
                owner: self.id,
                previous: current,
                optimistic,
            });
            entry.notify();

            self.targets.push((key.clone(), entry.id));
            applied += 1;
        }

        debug!(filter = %filter, applied, "Optimistic update applied");
        applied
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Keys rewritten so far.
    pub fn keys(&self) -> Vec<QueryKey> {
        self.targets.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Keeps the optimistic values.
    pub fn commit(mut self) {
        self.settled = true;
        let mut entries = self.client.inner.entries.lock();
        for (key, entry_id) in &self.targets {
            if let Some(entry) = entries.get_mut(key).filter(|entry| entry.id == *entry_id) {
                entry.patches.retain(|patch| patch.owner != self.id);
            }
        }
        debug!(patches = self.targets.len(), "Optimistic update committed");
    }

    /// Restores the values captured before `apply`. Returns how many
    /// entries were restored.
    pub fn compensate(mut self) -> usize {
        self.rollback()
    }

    fn rollback(&mut self) -> usize {
        self.settled = true;
        let mut entries = self.client.inner.entries.lock();
        let mut restored = 0;

        // Newest first, so stacked patches on one key unwind in order.
        for (key, entry_id) in self.targets.drain(..).rev() {
            let Some(entry) = entries.get_mut(&key).filter(|entry| entry.id == entry_id) else {
                continue;
            };
            let Some(index) = entry.patches.iter().rposition(|patch| patch.owner == self.id) else {
                continue;
            };
            let patch = entry.patches.remove(index);

            let untouched = entry
                .value
                .as_ref()
                .is_some_and(|value| Arc::ptr_eq(value, &patch.optimistic));
            if untouched {
                entry.value = Some(patch.previous);
                entry.notify();
                restored += 1;
                continue;
            }

            // A later optimistic patch was built on this one: it must
            // unwind to this patch's previous value instead.
            match entry
                .patches
                .get_mut(index)
                .filter(|later| Arc::ptr_eq(&later.previous, &patch.optimistic))
            {
                Some(later) => {
                    later.previous = patch.previous;
                    debug!(key = %key, "Rollback handed to the stacked optimistic update");
                },
                None => {
                    debug!(key = %key, "Entry changed since optimistic update, not restoring");
                },
            }
        }
        restored
    }
}

impl Drop for OptimisticUpdate {
    fn drop(&mut self) {
        if !self.settled && !self.targets.is_empty() {
            let restored = self.rollback();
            warn!(restored, "Optimistic update dropped without commit, compensated");
        }
    }
}

impl QueryClient {
    /// Starts an empty optimistic update against this client.
    pub fn begin_optimistic(&self) -> OptimisticUpdate {
        OptimisticUpdate {
            client: self.clone(),
            id: self.next_id(),
            targets: Vec::new(),
            settled: false,
        }
    }

    /// Executes `mutation` on top of an already applied optimistic `update`.
    ///
    /// On success the update is committed and the usual success path runs.
    /// On failure the update is compensated and `failure` is the only
    /// notification emitted.
    pub async fn mutate_optimistic<V, R>(
        &self,
        mutation: &Mutation<V, R>,
        variables: V,
        update: OptimisticUpdate,
        failure: Notification,
    ) -> Result<R>
    where
        V: Clone + Send + 'static,
        R: Send + 'static,
    {
        match self.execute_mutation(mutation, variables).await {
            Ok(result) => {
                update.commit();
                self.complete_mutation(mutation, &result);
                Ok(result)
            },
            Err(err) => {
                let restored = update.compensate();
                warn!(mutation = %mutation.name(), restored, error = %err, "Optimistic mutation rolled back");
                self.inner.notifier.notify(failure);
                Err(err)
            },
        }
    }
}
