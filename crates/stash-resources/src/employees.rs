//! Employee queries and mutations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use stash_cache::{Mutation, Notification, Query, QueryFilter};
use stash_core::model::{NewPerson, Person, PersonPatch};
use stash_core::{KeyFactory, StashError};
use uuid::Uuid;

use crate::transport::EmployeeTransport;

pub const EMPLOYEES: &str = "employees";

const DIRECTORY_STALE_TIME: Duration = Duration::from_secs(5 * 60);
const DIRECTORY_GC_TIME: Duration = Duration::from_secs(10 * 60);

/// Key factory for `["employees"]`.
pub fn employee_keys() -> KeyFactory {
    KeyFactory::new(EMPLOYEES)
}

#[derive(Clone)]
pub struct EmployeeQueries {
    transport: Arc<dyn EmployeeTransport>,
    keys: KeyFactory,
}

impl EmployeeQueries {
    pub fn new(transport: Arc<dyn EmployeeTransport>) -> Self {
        Self {
            transport,
            keys: employee_keys(),
        }
    }

    pub fn keys(&self) -> &KeyFactory {
        &self.keys
    }

    /// The whole directory: fresh for 5 min, kept 10 min.
    pub fn all(&self) -> Query<Vec<Person>> {
        let transport = Arc::clone(&self.transport);
        Query::new(self.keys.list("all"), move || {
            let transport = Arc::clone(&transport);
            async move { transport.all().await }
        })
        .stale_time(DIRECTORY_STALE_TIME)
        .gc_time(DIRECTORY_GC_TIME)
    }

    pub fn by_id(&self, id: Uuid) -> Query<Person> {
        let transport = Arc::clone(&self.transport);
        Query::new(self.keys.detail(id), move || {
            let transport = Arc::clone(&transport);
            async move { transport.by_id(id).await }
        })
    }

    pub fn search(&self, term: &str) -> Query<Vec<Person>> {
        let term = term.trim().to_string();
        let transport = Arc::clone(&self.transport);
        Query::new(self.keys.list(format!("search:{}", term)), move || {
            let transport = Arc::clone(&transport);
            let term = term.clone();
            async move { transport.search(&term).await }
        })
    }
}

impl fmt::Debug for EmployeeQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeQueries")
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// Variables of the update mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeUpdate {
    pub id: Uuid,
    pub patch: PersonPatch,
}

#[derive(Clone)]
pub struct EmployeeMutations {
    transport: Arc<dyn EmployeeTransport>,
    keys: KeyFactory,
}

impl EmployeeMutations {
    pub fn new(transport: Arc<dyn EmployeeTransport>) -> Self {
        Self {
            transport,
            keys: employee_keys(),
        }
    }

    pub fn create(&self) -> Mutation<NewPerson, Person> {
        let transport = Arc::clone(&self.transport);
        Mutation::new("create-employee", move |person: NewPerson| {
            let transport = Arc::clone(&transport);
            async move { transport.create(&person).await }
        })
        .invalidates([self.keys.all()])
        .notify_with(|person: &Person| Notification::success("Employee created", person.full_name()))
    }

    pub fn update(&self) -> Mutation<EmployeeUpdate, Person> {
        let transport = Arc::clone(&self.transport);
        let keys = self.keys.clone();
        Mutation::new("update-employee", move |update: EmployeeUpdate| {
            let transport = Arc::clone(&transport);
            async move { transport.update(update.id, &update.patch).await }
        })
        .invalidates([self.keys.all()])
        .on_success(move |client, person: &Person| {
            client.set_query_data(keys.detail(person.id), person.clone());
        })
        .notify_with(|person: &Person| Notification::success("Employee updated", person.full_name()))
    }

    /// Deletes an employee. Resolves to the deleted id.
    pub fn delete(&self) -> Mutation<Uuid, Uuid> {
        let transport = Arc::clone(&self.transport);
        let keys = self.keys.clone();
        Mutation::new("delete-employee", move |id: Uuid| {
            let transport = Arc::clone(&transport);
            async move {
                if transport.delete(id).await? {
                    Ok(id)
                } else {
                    Err(StashError::not_found(EMPLOYEES, id))
                }
            }
        })
        .invalidates([self.keys.all()])
        .on_success(move |client, id: &Uuid| {
            client.remove_queries(&QueryFilter::exact(keys.detail(*id)));
        })
        .notify_with(|id: &Uuid| Notification::success("Employee deleted", format!("Employee {} removed", id)))
    }
}

impl fmt::Debug for EmployeeMutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeMutations")
            .field("transport", &self.transport.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockEmployeeTransport;

    #[test]
    fn test_employee_keys() {
        let queries = EmployeeQueries::new(Arc::new(MockEmployeeTransport::seeded(1)));

        assert_eq!(queries.all().key().to_string(), "employees/list/{filters:all}");
        assert_eq!(
            queries.search(" ada ").key().to_string(),
            "employees/list/{filters:search:ada}"
        );
        assert!(queries.all().key().starts_with(&employee_keys().lists()));
    }
}
