use std::sync::Arc;

use crate::config::Config;
use crate::group::GroupService;
use crate::store::{GroupStore, ListingStore, MemoryStore, PgStore, UserDirectory};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Group operations bound to the configured store
    pub groups: GroupService,
    /// Account lookup for login and session resolution
    pub users: Arc<dyn UserDirectory>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state over separate store handles
    pub fn new(
        groups: Arc<dyn GroupStore>,
        users: Arc<dyn UserDirectory>,
        listings: Arc<dyn ListingStore>,
        config: Config,
    ) -> Self {
        Self {
            groups: GroupService::new(groups, users.clone(), listings),
            users,
            config: Arc::new(config),
        }
    }

    /// State over the in-process store
    pub fn with_memory(store: Arc<MemoryStore>, config: Config) -> Self {
        Self::new(store.clone(), store.clone(), store, config)
    }

    /// State over PostgreSQL
    pub fn with_postgres(store: PgStore, config: Config) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store, config)
    }
}
