//! In-memory transports.
//!
//! These back the offline demo and the test suites. Each one counts
//! calls per operation and can simulate upstream latency.

mod employees;
mod meals;
mod todos;

pub use employees::{DIRECTORY_SIZE, EmployeeLatency, MockEmployeeTransport};
pub use meals::StaticMealTransport;
pub use todos::MemoryTodoStore;

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

/// Per-operation call counter.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl CallLog {
    pub fn record(&self, operation: &'static str) {
        *self.calls.lock().entry(operation).or_default() += 1;
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or_default()
    }
}

pub(crate) async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}
