use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::seq::IteratorRandom;
use stash_core::model::{
    CreateTodoRequest, DeleteTodoResponse, Todo, TodosResponse, UpdateTodoRequest,
};
use stash_core::{Result, StashError};
use tracing::debug;

use super::{CallLog, simulate_latency};
use crate::transport::TodoTransport;

const RESOURCE: &str = "todos";

/// A todo API kept in memory.
///
/// Unlike the public demo API, writes persist: a created todo shows up
/// in later list reads. Failures can be queued with
/// [`fail_next`](Self::fail_next) and are returned by the next calls in
/// order, whatever the operation.
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    todos: Mutex<BTreeMap<i64, Todo>>,
    failures: Mutex<VecDeque<StashError>>,
    calls: CallLog,
    latency: Duration,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `todos`.
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        Self {
            todos: Mutex::new(todos.into_iter().map(|todo| (todo.id, todo)).collect()),
            ..Self::default()
        }
    }

    /// Creates a store with `count` todos spread over ten users.
    pub fn seeded(count: i64) -> Self {
        Self::with_todos((1..=count).map(|id| Todo {
            id,
            todo: format!("Todo {}", id),
            completed: id % 3 == 0,
            user_id: (id - 1) % 10 + 1,
        }))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queues an error for the next call.
    pub fn fail_next(&self, error: StashError) {
        self.failures.lock().push_back(error);
    }

    /// Number of calls made to `operation` ("list", "get", "create", ...).
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.count(operation)
    }

    /// Returns every stored todo, ordered by id.
    pub fn todos(&self) -> Vec<Todo> {
        self.todos.lock().values().cloned().collect()
    }

    async fn begin(&self, operation: &'static str) -> Result<()> {
        self.calls.record(operation);
        simulate_latency(self.latency).await;
        match self.failures.lock().pop_front() {
            Some(err) => {
                debug!(operation, error = %err, "Injected failure");
                Err(err)
            },
            None => Ok(()),
        }
    }
}

fn page(todos: Vec<Todo>, total: u64, limit: u64, skip: u64) -> TodosResponse {
    TodosResponse {
        todos,
        total,
        skip,
        limit,
    }
}

#[async_trait]
impl TodoTransport for MemoryTodoStore {
    async fn list(&self, limit: u64, skip: u64) -> Result<TodosResponse> {
        self.begin("list").await?;
        let todos = self.todos.lock();
        let items: Vec<_> = todos
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(page(items, todos.len() as u64, limit, skip))
    }

    async fn get(&self, id: i64) -> Result<Todo> {
        self.begin("get").await?;
        self.todos
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| StashError::not_found(RESOURCE, id))
    }

    async fn random(&self) -> Result<Todo> {
        self.begin("random").await?;
        self.todos
            .lock()
            .values()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| StashError::not_found(RESOURCE, "random"))
    }

    async fn by_user(&self, user_id: i64) -> Result<TodosResponse> {
        self.begin("by_user").await?;
        let items: Vec<_> = self
            .todos
            .lock()
            .values()
            .filter(|todo| todo.user_id == user_id)
            .cloned()
            .collect();
        let total = items.len() as u64;
        Ok(page(items, total, total, 0))
    }

    async fn create(&self, request: &CreateTodoRequest) -> Result<Todo> {
        self.begin("create").await?;
        let mut todos = self.todos.lock();
        let id = todos.keys().next_back().copied().unwrap_or_default() + 1;
        let todo = Todo {
            id,
            todo: request.todo.clone(),
            completed: request.completed,
            user_id: request.user_id,
        };
        todos.insert(id, todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: i64, request: &UpdateTodoRequest) -> Result<Todo> {
        self.begin("update").await?;
        let mut todos = self.todos.lock();
        let todo = todos
            .get_mut(&id)
            .ok_or_else(|| StashError::not_found(RESOURCE, id))?;
        *todo = todo.patched(request);
        Ok(todo.clone())
    }

    async fn delete(&self, id: i64) -> Result<DeleteTodoResponse> {
        self.begin("delete").await?;
        let todo = self
            .todos
            .lock()
            .remove(&id)
            .ok_or_else(|| StashError::not_found(RESOURCE, id))?;
        Ok(DeleteTodoResponse {
            todo,
            is_deleted: true,
            deleted_on: Utc::now().to_rfc3339(),
        })
    }

    fn name(&self) -> &str {
        "memory-todos"
    }
}
