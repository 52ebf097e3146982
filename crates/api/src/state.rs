//! Application state shared across handlers.

use chrono::FixedOffset;
use moka::future::Cache;
use presence_core::clock::offset_from_secs;
use presence_core::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use store::SharedStore;
use telemetry::metrics;
use tracing::{debug, warn};
use tracker::{
    ActivityLog, ActivityLogConfig, AdminCache, PresenceConfig, PresenceTracker, UserDirectory,
};

/// Cache TTL for the online count shown on the dashboard (30 seconds).
const ONLINE_COUNT_TTL: Duration = Duration::from_secs(30);

/// Cache TTL for user totals shown on the dashboard (5 minutes).
const USER_COUNTS_TTL: Duration = Duration::from_secs(300);

const ONLINE_COUNT_KEY: &str = "online_users_count";
const TOTAL_USERS_KEY: &str = "total_users_count";
const TODAY_REGISTRATIONS_KEY: &str = "today_registrations";

/// Short-lived in-process cache for dashboard counters.
///
/// Keeps dashboard polling from hitting the store on every refresh.
#[derive(Clone)]
pub struct DashboardCache {
    online: Cache<&'static str, usize>,
    users: Cache<&'static str, usize>,
}

impl DashboardCache {
    pub fn new() -> Self {
        Self {
            online: Cache::builder()
                .max_capacity(16)
                .time_to_live(ONLINE_COUNT_TTL)
                .build(),
            users: Cache::builder()
                .max_capacity(16)
                .time_to_live(USER_COUNTS_TTL)
                .build(),
        }
    }

    /// Online user count; 0 when the store cannot be reached.
    ///
    /// Failures are not cached so the next poll retries.
    pub async fn online_count(&self, presence: &PresenceTracker) -> usize {
        let computed = cached(&self.online, ONLINE_COUNT_KEY, presence.online_users_count()).await;
        computed.unwrap_or_else(|e| {
            warn!(error = %e, "Online count unavailable, showing 0");
            0
        })
    }

    pub async fn total_users<F>(&self, compute: F) -> presence_core::Result<usize>
    where
        F: Future<Output = presence_core::Result<usize>>,
    {
        cached(&self.users, TOTAL_USERS_KEY, compute).await
    }

    pub async fn today_registrations<F>(&self, compute: F) -> presence_core::Result<usize>
    where
        F: Future<Output = presence_core::Result<usize>>,
    {
        cached(&self.users, TODAY_REGISTRATIONS_KEY, compute).await
    }

    /// Drops every cached counter.
    pub fn invalidate_all(&self) {
        self.online.invalidate_all();
        self.users.invalidate_all();
    }
}

impl Default for DashboardCache {
    fn default() -> Self {
        Self::new()
    }
}

async fn cached<F>(
    cache: &Cache<&'static str, usize>,
    key: &'static str,
    compute: F,
) -> presence_core::Result<usize>
where
    F: Future<Output = presence_core::Result<usize>>,
{
    if let Some(value) = cache.get(&key).await {
        metrics().dashboard_cache_hits.inc();
        debug!(key, "Dashboard cache hit");
        return Ok(value);
    }

    metrics().dashboard_cache_misses.inc();
    let value = compute.await?;
    cache.insert(key, value).await;
    Ok(value)
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Presence tracker
    pub presence: Arc<PresenceTracker>,
    /// Activity log
    pub activity: Arc<ActivityLog>,
    /// Admin dashboard cache (in the store)
    pub admin_cache: Arc<AdminCache>,
    /// External user records
    pub users: Arc<dyn UserDirectory>,
    /// Backing store (Redis in production, embedded in tests)
    pub store: SharedStore,
    pub clock: Arc<dyn Clock>,
    /// Calendar offset used for "today"
    pub offset: FixedOffset,
    pub dashboard: DashboardCache,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserDirectory>,
        presence: PresenceConfig,
        activity: ActivityLogConfig,
    ) -> Self {
        let offset = offset_from_secs(activity.utc_offset_secs);

        Self {
            presence: Arc::new(PresenceTracker::new(store.clone(), clock.clone(), presence)),
            activity: Arc::new(ActivityLog::new(store.clone(), clock.clone(), activity)),
            admin_cache: Arc::new(AdminCache::new(store.clone(), clock.clone(), offset)),
            users,
            store,
            clock,
            offset,
            dashboard: DashboardCache::new(),
        }
    }
}
