//! Common test setup functions.

use api::{router, state::AppState};
use axum::Router;
use axum_test::TestServer;
use presence_core::ManualClock;
use std::sync::Arc;
use store::{MemoryStore, SharedStore, StoreBackend, StoreConfig};
use tracker::{ActivityLogConfig, InMemoryUserDirectory, PresenceConfig};

use crate::containers::TestContainers;
use crate::fixtures::{seeded_users, T0};
use crate::mocks::FailingStore;

/// Test context wired like production, with a manual clock.
///
/// - Uses the real Axum router with all middleware
/// - Uses the embedded store by default, `FailingStore` or Redis on request
/// - Seeds the user directory with `fixtures::seeded_users`
pub struct TestContext {
    pub store: SharedStore,
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserDirectory>,
    pub state: AppState,
    pub router: Router,
}

impl TestContext {
    /// Embedded store driven by the test clock.
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::at_timestamp(T0));
        let store: SharedStore = Arc::new(MemoryStore::with_clock(clock.clone()));
        Self::build(store, clock)
    }

    /// Every store command fails.
    pub fn failing() -> Self {
        let clock = Arc::new(ManualClock::at_timestamp(T0));
        Self::build(Arc::new(FailingStore::new()), clock)
    }

    /// Real Redis. Redis keeps its own time, so the manual clock should be
    /// set to wall time by the caller before relying on expiry.
    pub async fn redis(containers: &TestContainers, clock: Arc<ManualClock>) -> Self {
        let config = StoreConfig {
            backend: StoreBackend::Redis,
            redis_url: containers.redis_url.clone(),
            ..StoreConfig::default()
        };
        let store = store::connect(&config, clock.clone())
            .await
            .expect("Failed to connect to Redis");
        Self::build(store, clock)
    }

    /// Any store, sharing the given clock.
    pub fn with_store(store: SharedStore, clock: Arc<ManualClock>) -> Self {
        Self::build(store, clock)
    }

    fn build(store: SharedStore, clock: Arc<ManualClock>) -> Self {
        let users = Arc::new(InMemoryUserDirectory::from_records(seeded_users()));
        let state = AppState::new(
            store.clone(),
            clock.clone(),
            users.clone(),
            PresenceConfig::default(),
            ActivityLogConfig::default(),
        );
        let router = router(state.clone());

        Self {
            store,
            clock,
            users,
            state,
            router,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
