//! Upstream transports.
//!
//! Each resource reads and writes through a trait object so the same
//! query and mutation definitions run against the live HTTP APIs, the
//! in-memory stores in [`crate::memory`], or a test double.

mod http;

pub use http::{HttpConfig, HttpMealTransport, HttpTodoTransport};

use async_trait::async_trait;
use stash_core::Result;
use stash_core::model::{
    CreateTodoRequest, DeleteTodoResponse, Meal, NewPerson, Person, PersonPatch, Todo,
    TodosResponse, UpdateTodoRequest,
};
use uuid::Uuid;

/// Access to the todo API.
///
/// Pagination follows the upstream `limit`/`skip` convention; the
/// response always carries the total item count.
#[async_trait]
pub trait TodoTransport: Send + Sync {
    /// Fetches one page of todos.
    async fn list(&self, limit: u64, skip: u64) -> Result<TodosResponse>;

    /// Fetches one todo.
    ///
    /// # Errors
    ///
    /// - `StashError::NotFound` if no todo has this id
    async fn get(&self, id: i64) -> Result<Todo>;

    /// Fetches a random todo.
    async fn random(&self) -> Result<Todo>;

    /// Fetches every todo of one user.
    async fn by_user(&self, user_id: i64) -> Result<TodosResponse>;

    async fn create(&self, request: &CreateTodoRequest) -> Result<Todo>;

    async fn update(&self, id: i64, request: &UpdateTodoRequest) -> Result<Todo>;

    async fn delete(&self, id: i64) -> Result<DeleteTodoResponse>;

    /// Returns the name of this transport, for logging.
    fn name(&self) -> &str;
}

/// Read-only access to the meal catalogue.
#[async_trait]
pub trait MealTransport: Send + Sync {
    /// Fetches the catalogue listing. An empty upstream result is an
    /// empty list, not an error.
    async fn all(&self) -> Result<Vec<Meal>>;

    /// Fetches one meal.
    ///
    /// # Errors
    ///
    /// - `StashError::Validation` if `id` is blank or the payload is incomplete
    /// - `StashError::NotFound` if upstream has no meal with this id
    async fn by_id(&self, id: &str) -> Result<Meal>;

    fn name(&self) -> &str;
}

/// Access to the employee directory.
#[async_trait]
pub trait EmployeeTransport: Send + Sync {
    async fn all(&self) -> Result<Vec<Person>>;

    async fn by_id(&self, id: Uuid) -> Result<Person>;

    async fn create(&self, person: &NewPerson) -> Result<Person>;

    async fn update(&self, id: Uuid, patch: &PersonPatch) -> Result<Person>;

    /// Returns whether a record was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Case-insensitive search on name, email and job title.
    async fn search(&self, query: &str) -> Result<Vec<Person>>;

    fn name(&self) -> &str;
}
