use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use stash_core::Result;
use stash_core::model::employee::{generate_person, generate_persons};
use stash_core::model::{NewPerson, Person, PersonPatch};
use tracing::debug;
use uuid::Uuid;

use super::{CallLog, simulate_latency};
use crate::transport::EmployeeTransport;

/// Size of the fixed directory.
pub const DIRECTORY_SIZE: usize = 20;

/// Simulated latency per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmployeeLatency {
    pub all: Duration,
    pub by_id: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
    pub search: Duration,
}

impl Default for EmployeeLatency {
    fn default() -> Self {
        Self {
            all: Duration::from_millis(2000),
            by_id: Duration::from_millis(300),
            create: Duration::from_millis(400),
            update: Duration::from_millis(400),
            delete: Duration::from_millis(300),
            search: Duration::from_millis(600),
        }
    }
}

impl EmployeeLatency {
    pub fn none() -> Self {
        Self {
            all: Duration::ZERO,
            by_id: Duration::ZERO,
            create: Duration::ZERO,
            update: Duration::ZERO,
            delete: Duration::ZERO,
            search: Duration::ZERO,
        }
    }
}

/// A mock employee directory.
///
/// The directory is generated once at construction and returned unchanged
/// by every `all` call. Writes are acknowledged but not persisted.
#[derive(Debug)]
pub struct MockEmployeeTransport {
    directory: Vec<Person>,
    rng: Mutex<StdRng>,
    latency: EmployeeLatency,
    calls: CallLog,
}

impl MockEmployeeTransport {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates a directory that is identical for equal seeds.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: StdRng) -> Self {
        let directory = generate_persons(&mut rng, DIRECTORY_SIZE);
        debug!(count = directory.len(), "Employee directory generated");
        Self {
            directory,
            rng: Mutex::new(rng),
            latency: EmployeeLatency::default(),
            calls: CallLog::default(),
        }
    }

    pub fn with_latency(mut self, latency: EmployeeLatency) -> Self {
        self.latency = latency;
        self
    }

    pub fn directory(&self) -> &[Person] {
        &self.directory
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.count(operation)
    }

    /// The directory record with `id`, or a generated one carrying that id.
    fn lookup(&self, id: Uuid) -> Person {
        self.directory
            .iter()
            .find(|person| person.id == id)
            .cloned()
            .unwrap_or_else(|| {
                let mut person = generate_person(&mut *self.rng.lock());
                person.id = id;
                person
            })
    }
}

impl Default for MockEmployeeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmployeeTransport for MockEmployeeTransport {
    async fn all(&self) -> Result<Vec<Person>> {
        self.calls.record("all");
        simulate_latency(self.latency.all).await;
        Ok(self.directory.clone())
    }

    async fn by_id(&self, id: Uuid) -> Result<Person> {
        self.calls.record("by_id");
        simulate_latency(self.latency.by_id).await;
        Ok(self.lookup(id))
    }

    async fn create(&self, person: &NewPerson) -> Result<Person> {
        self.calls.record("create");
        simulate_latency(self.latency.create).await;
        Ok(Person::from_new(Uuid::new_v4(), person.clone()))
    }

    async fn update(&self, id: Uuid, patch: &PersonPatch) -> Result<Person> {
        self.calls.record("update");
        simulate_latency(self.latency.update).await;
        Ok(self.lookup(id).patched(patch))
    }

    async fn delete(&self, _id: Uuid) -> Result<bool> {
        self.calls.record("delete");
        simulate_latency(self.latency.delete).await;
        Ok(true)
    }

    async fn search(&self, query: &str) -> Result<Vec<Person>> {
        self.calls.record("search");
        simulate_latency(self.latency.search).await;
        Ok(self
            .directory
            .iter()
            .filter(|person| person.matches(query))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "mock-employees"
    }
}
