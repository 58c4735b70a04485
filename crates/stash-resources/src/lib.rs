//! Stash Resources - Query and mutation definitions for the demo resources
//!
//! Three resources, each with its own key subtree:
//!
//! - **todos**: paginated CRUD against the dummyjson todo API
//! - **meals**: the read-only TheMealDB catalogue
//! - **employees**: a generated, fixed employee directory
//!
//! Definitions are built over transport trait objects, so the same
//! [`TodoQueries`] run against [`HttpTodoTransport`] in production and
//! [`MemoryTodoStore`] in tests.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stash_cache::{CacheConfig, QueryClient};
//! use stash_resources::{MemoryTodoStore, TodoMutations, TodoQueries};
//! use stash_core::model::CreateTodoRequest;
//!
//! # #[tokio::main]
//! # async fn main() -> stash_core::Result<()> {
//! let store = Arc::new(MemoryTodoStore::seeded(10));
//! let client = QueryClient::new(CacheConfig::default());
//! let queries = TodoQueries::new(store.clone());
//! let mutations = TodoMutations::new(store);
//!
//! let page = client.fetch_query(&queries.page(1)).await?;
//! client
//!     .mutate(&mutations.create(), CreateTodoRequest::new("Buy milk", 1))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod employees;
pub mod meals;
pub mod memory;
pub mod todos;
pub mod transport;

pub use employees::{EmployeeMutations, EmployeeQueries, EmployeeUpdate, employee_keys};
pub use meals::{MealQueries, meal_keys};
pub use memory::{EmployeeLatency, MemoryTodoStore, MockEmployeeTransport, StaticMealTransport};
pub use todos::{TodoMutations, TodoQueries, TodoUpdate, todo_keys};
pub use transport::{
    EmployeeTransport, HttpConfig, HttpMealTransport, HttpTodoTransport, MealTransport,
    TodoTransport,
};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }
}
