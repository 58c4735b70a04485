//! Todo queries and mutations.
//!
//! Keys live under `["todos"]`. Pages are `todos/list/{limit:L,skip:S}`,
//! a user's todos `todos/list/{userId:U}`, single todos
//! `todos/detail/{id}`. Every mutation invalidates the whole `["todos"]`
//! subtree.

use std::fmt;
use std::sync::Arc;

use stash_cache::{Mutation, Notification, Query, QueryClient, QueryFilter};
use stash_core::model::{
    CreateTodoRequest, DeleteTodoResponse, Todo, TodosResponse, UpdateTodoRequest,
};
use stash_core::{KeyFactory, Result, StashError};
use tracing::debug;

use crate::transport::TodoTransport;

pub const TODOS: &str = "todos";

/// Page size used by [`TodoQueries::page`].
pub const DEFAULT_LIMIT: u64 = 30;

pub const TOGGLE_FAILED: &str = "Failed to update todo";
pub const TOGGLE_FAILED_DETAIL: &str = "Please try again";

/// Key factory for `["todos"]`.
pub fn todo_keys() -> KeyFactory {
    KeyFactory::new(TODOS)
}

/// Read definitions for todos.
#[derive(Clone)]
pub struct TodoQueries {
    transport: Arc<dyn TodoTransport>,
    keys: KeyFactory,
}

impl TodoQueries {
    pub fn new(transport: Arc<dyn TodoTransport>) -> Self {
        Self {
            transport,
            keys: todo_keys(),
        }
    }

    pub fn keys(&self) -> &KeyFactory {
        &self.keys
    }

    /// One page: `todos/list/{limit:L,skip:S}`.
    pub fn list(&self, limit: u64, skip: u64) -> Query<TodosResponse> {
        let transport = Arc::clone(&self.transport);
        let key = self.keys.list(format!("limit:{},skip:{}", limit, skip));
        Query::new(key, move || {
            let transport = Arc::clone(&transport);
            async move { transport.list(limit, skip).await }
        })
    }

    /// Page `page` (1-based) of [`DEFAULT_LIMIT`] todos.
    pub fn page(&self, page: u64) -> Query<TodosResponse> {
        self.list(DEFAULT_LIMIT, page.saturating_sub(1) * DEFAULT_LIMIT)
    }

    pub fn by_id(&self, id: i64) -> Query<Todo> {
        let transport = Arc::clone(&self.transport);
        Query::new(self.keys.detail(id), move || {
            let transport = Arc::clone(&transport);
            async move { transport.get(id).await }
        })
    }

    /// `todos/random`
    pub fn random(&self) -> Query<Todo> {
        let transport = Arc::clone(&self.transport);
        Query::new(self.keys.scoped("random"), move || {
            let transport = Arc::clone(&transport);
            async move { transport.random().await }
        })
    }

    /// `todos/list/{userId:U}`
    pub fn by_user(&self, user_id: i64) -> Query<TodosResponse> {
        let transport = Arc::clone(&self.transport);
        let key = self.keys.list(format!("userId:{}", user_id));
        Query::new(key, move || {
            let transport = Arc::clone(&transport);
            async move { transport.by_user(user_id).await }
        })
    }
}

impl fmt::Debug for TodoQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoQueries")
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// Variables of the update mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoUpdate {
    pub id: i64,
    pub changes: UpdateTodoRequest,
}

/// Write definitions for todos.
#[derive(Clone)]
pub struct TodoMutations {
    transport: Arc<dyn TodoTransport>,
    keys: KeyFactory,
}

impl TodoMutations {
    pub fn new(transport: Arc<dyn TodoTransport>) -> Self {
        Self {
            transport,
            keys: todo_keys(),
        }
    }

    /// Creates a todo. Notifies "Todo created" with the todo's text.
    pub fn create(&self) -> Mutation<CreateTodoRequest, Todo> {
        let transport = Arc::clone(&self.transport);
        Mutation::new("create-todo", move |request: CreateTodoRequest| {
            let transport = Arc::clone(&transport);
            async move {
                request.validate()?;
                transport.create(&request).await
            }
        })
        .invalidates([self.keys.all()])
        .notify_with(|todo: &Todo| Notification::success("Todo created", todo.todo.clone()))
    }

    /// Updates a todo and stores the returned record as its detail entry.
    pub fn update(&self) -> Mutation<TodoUpdate, Todo> {
        let transport = Arc::clone(&self.transport);
        let keys = self.keys.clone();
        Mutation::new("update-todo", move |update: TodoUpdate| {
            let transport = Arc::clone(&transport);
            async move {
                update.changes.validate()?;
                transport.update(update.id, &update.changes).await
            }
        })
        .invalidates([self.keys.all()])
        .on_success(move |client, todo: &Todo| {
            client.set_query_data(keys.detail(todo.id), todo.clone());
        })
        .notify_with(|todo: &Todo| Notification::success("Todo updated", todo.todo.clone()))
    }

    /// Deletes a todo and drops its detail entry.
    pub fn delete(&self) -> Mutation<i64, DeleteTodoResponse> {
        let transport = Arc::clone(&self.transport);
        let keys = self.keys.clone();
        Mutation::new("delete-todo", move |id: i64| {
            let transport = Arc::clone(&transport);
            async move { transport.delete(id).await }
        })
        .invalidates([self.keys.all()])
        .on_success(move |client, deleted: &DeleteTodoResponse| {
            client.remove_queries(&QueryFilter::exact(keys.detail(deleted.todo.id)));
        })
        .notify_with(|deleted: &DeleteTodoResponse| {
            Notification::success("Todo deleted", deleted.todo.todo.clone())
        })
    }

    /// Flips `completed` on todo `id` everywhere it is cached, then
    /// confirms through the update mutation.
    ///
    /// On failure every optimistic change is rolled back and the only
    /// notification is "Failed to update todo".
    ///
    /// # Errors
    ///
    /// - `StashError::NotCached` if the todo is in no cached entry
    /// - any error of the update mutation
    pub async fn toggle_complete(&self, client: &QueryClient, id: i64) -> Result<Todo> {
        let current = self
            .cached_todo(client, id)
            .ok_or_else(|| StashError::not_cached(self.keys.detail(id)))?;

        let mut update = client.begin_optimistic();
        update.apply(&QueryFilter::exact(self.keys.detail(id)), |todo: &Todo| {
            Some(todo.toggled())
        });
        update.apply(&QueryFilter::prefix(self.keys.lists()), |page: &TodosResponse| {
            page.contains(id).then(|| page.map_todo(id, Todo::toggled))
        });
        debug!(id, entries = update.keys().len(), "Todo toggled optimistically");

        let variables = TodoUpdate {
            id,
            changes: UpdateTodoRequest::completed(!current.completed),
        };
        client
            .mutate_optimistic(
                &self.update(),
                variables,
                update,
                Notification::error(TOGGLE_FAILED, TOGGLE_FAILED_DETAIL),
            )
            .await
    }

    /// The cached todo `id`: its detail entry, else the first cached page holding it.
    fn cached_todo(&self, client: &QueryClient, id: i64) -> Option<Todo> {
        if let Some(todo) = client.get_query_data::<Todo>(&self.keys.detail(id)) {
            return Some((*todo).clone());
        }
        let lists = self.keys.lists();
        client
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&lists))
            .filter_map(|key| client.get_query_data::<TodosResponse>(&key))
            .find_map(|page| page.find(id).cloned())
    }
}

impl fmt::Debug for TodoMutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoMutations")
            .field("transport", &self.transport.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTodoStore;

    fn queries() -> TodoQueries {
        TodoQueries::new(Arc::new(MemoryTodoStore::seeded(5)))
    }

    #[test]
    fn test_query_keys() {
        let queries = queries();

        assert_eq!(queries.list(30, 0).key().to_string(), "todos/list/{filters:limit:30,skip:0}");
        assert_eq!(queries.page(2).key(), queries.list(30, 30).key());
        assert_eq!(queries.by_id(5).key().to_string(), "todos/detail/5");
        assert_eq!(queries.random().key().to_string(), "todos/random");
        assert_eq!(queries.by_user(3).key().to_string(), "todos/list/{filters:userId:3}");
    }

    #[test]
    fn test_every_mutation_invalidates_todos() {
        let mutations = TodoMutations::new(Arc::new(MemoryTodoStore::new()));
        let expected = QueryFilter::Prefix(todo_keys().all());

        assert_eq!(mutations.create().invalidation_filter(), expected);
        assert_eq!(mutations.update().invalidation_filter(), expected);
        assert_eq!(mutations.delete().invalidation_filter(), expected);
    }
}
