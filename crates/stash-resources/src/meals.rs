//! Meal queries.
//!
//! The catalogue is read-only; there are no meal mutations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use stash_cache::Query;
use stash_core::KeyFactory;
use stash_core::model::Meal;

use crate::transport::MealTransport;

pub const MEALS: &str = "meals";

const LISTING_STALE_TIME: Duration = Duration::from_secs(30);
const LISTING_GC_TIME: Duration = Duration::from_secs(30 * 60);
const DETAIL_STALE_TIME: Duration = Duration::from_secs(15 * 60);
const DETAIL_GC_TIME: Duration = Duration::from_secs(60 * 60);

/// Key factory for `["meals"]`.
pub fn meal_keys() -> KeyFactory {
    KeyFactory::new(MEALS)
}

#[derive(Clone)]
pub struct MealQueries {
    transport: Arc<dyn MealTransport>,
    keys: KeyFactory,
}

impl MealQueries {
    pub fn new(transport: Arc<dyn MealTransport>) -> Self {
        Self {
            transport,
            keys: meal_keys(),
        }
    }

    pub fn keys(&self) -> &KeyFactory {
        &self.keys
    }

    /// The catalogue listing under `["meals"]`: fresh for 30 s, kept 30 min.
    pub fn all(&self) -> Query<Vec<Meal>> {
        let transport = Arc::clone(&self.transport);
        Query::new(self.keys.all(), move || {
            let transport = Arc::clone(&transport);
            async move { transport.all().await }
        })
        .stale_time(LISTING_STALE_TIME)
        .gc_time(LISTING_GC_TIME)
    }

    /// One meal under `meals/detail/{id}`: fresh for 15 min, kept 1 h.
    pub fn detail(&self, id: impl Into<String>) -> Query<Meal> {
        let id = id.into();
        let transport = Arc::clone(&self.transport);
        Query::new(self.keys.detail(&id), move || {
            let transport = Arc::clone(&transport);
            let id = id.clone();
            async move { transport.by_id(&id).await }
        })
        .stale_time(DETAIL_STALE_TIME)
        .gc_time(DETAIL_GC_TIME)
    }
}

impl fmt::Debug for MealQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MealQueries")
            .field("transport", &self.transport.name())
            .finish()
    }
}
