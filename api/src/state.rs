use crate::auth_middleware::BasicAuthAccounts;
use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::store::KeyValueStore;
use axum::extract::FromRef;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<KeyValueStore>,
    pub accounts: BasicAuthAccounts,
    pub clock: Clock,
    pub started_at: Instant,
    pub registry: Registry,
}

impl AppState {
    pub fn new(config: &ServerConfig, registry: Registry) -> Self {
        Self {
            store: Arc::new(KeyValueStore::new()),
            accounts: BasicAuthAccounts::new(&config.accounts),
            clock: Clock::System,
            started_at: Instant::now(),
            registry,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

impl FromRef<AppState> for Clock {
    fn from_ref(state: &AppState) -> Self {
        state.clock
    }
}
