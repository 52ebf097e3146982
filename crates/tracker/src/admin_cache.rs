//! Cached admin dashboard data under the `admin:` namespace.

use chrono::FixedOffset;
use presence_core::keys::{admin_config_key, admin_key, admin_pattern};
use presence_core::limits::{
    ADMIN_CACHE_DEFAULT_TTL_SECS, ADMIN_ONLINE_ACTIVITY_MAX_LIMIT, ADMIN_ONLINE_ACTIVITY_TTL_SECS,
};
use presence_core::{Clock, Result, UserActivity, UserRecord, UserStats};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use store::SharedStore;
use tracing::{debug, warn};

use crate::directory::{user_stats, UserDirectory};
use crate::presence::PresenceTracker;

/// An online user with both their record and activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUserActivity {
    pub user: UserRecord,
    pub activity: UserActivity,
}

/// Cache diagnostics; strings are preformatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_keys: usize,
    pub memory_usage: String,
    pub hit_ratio: String,
}

impl CacheStats {
    /// Placeholder shown when the store cannot be queried.
    pub fn unavailable() -> Self {
        Self {
            total_keys: 0,
            memory_usage: "N/A".to_string(),
            hit_ratio: "N/A".to_string(),
        }
    }
}

pub struct AdminCache {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl AdminCache {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            offset,
        }
    }

    /// Returns the cached value under `admin:{key}`, computing and storing it
    /// on a miss. Undecodable cached values count as a miss.
    pub async fn remember<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let full_key = admin_key(key);

        if let Some(raw) = self.store.get(&full_key).await? {
            match serde_json::from_str(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => warn!(key = %full_key, error = %e, "Discarding undecodable cache entry"),
            }
        }

        let value = compute().await?;
        self.store
            .set_ex(&full_key, serde_json::to_string(&value)?, ttl)
            .await?;
        debug!(key = %full_key, ttl_secs = ttl.as_secs(), "Cached admin value");
        Ok(value)
    }

    /// User counts, cached for an hour.
    pub async fn user_stats(&self, users: &dyn UserDirectory) -> Result<UserStats> {
        self.remember(
            "user_stats",
            Duration::from_secs(ADMIN_CACHE_DEFAULT_TTL_SECS),
            move || async move {
                let records = users.all().await?;
                Ok(user_stats(&records, self.clock.now(), self.offset))
            },
        )
        .await
    }

    /// Online users joined with their records, cached for five minutes.
    ///
    /// Users unknown to the directory are left out. `limit` is capped at
    /// [`ADMIN_ONLINE_ACTIVITY_MAX_LIMIT`].
    pub async fn recent_online_activity(
        &self,
        presence: &PresenceTracker,
        users: &dyn UserDirectory,
        limit: usize,
    ) -> Result<Vec<OnlineUserActivity>> {
        let limit = limit.min(ADMIN_ONLINE_ACTIVITY_MAX_LIMIT);
        self.remember(
            &format!("recent_activities:{limit}"),
            Duration::from_secs(ADMIN_ONLINE_ACTIVITY_TTL_SECS),
            move || async move {
                let mut joined = Vec::new();
                for online in presence.online_users_with_details().await? {
                    if joined.len() >= limit {
                        break;
                    }
                    if let Some(user) = users.find(online.user_id).await? {
                        joined.push(OnlineUserActivity {
                            user,
                            activity: online.activity,
                        });
                    }
                }
                Ok(joined)
            },
        )
        .await
    }

    /// Stores a config value under `admin:config:{key}`.
    pub async fn set_config(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.unwrap_or(Duration::from_secs(ADMIN_CACHE_DEFAULT_TTL_SECS));
        self.store
            .set_ex(&admin_config_key(key), serde_json::to_string(value)?, ttl)
            .await
    }

    /// Reads a config value; undecodable values read as absent.
    pub async fn config(&self, key: &str) -> Result<Option<Value>> {
        let raw = self.store.get(&admin_config_key(key)).await?;
        Ok(raw.and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    /// Drops one cached value; returns whether it existed.
    pub async fn clear(&self, key: &str) -> Result<bool> {
        Ok(self.store.del(&[admin_key(key)]).await? > 0)
    }

    /// Drops everything under `admin:`; returns how many keys went.
    pub async fn clear_all(&self) -> Result<u64> {
        let keys = self.store.keys(&admin_pattern()).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let removed = self.store.del(&keys).await?;
        debug!(removed, "Cleared admin cache");
        Ok(removed)
    }

    pub async fn cache_stats(&self) -> Result<CacheStats> {
        let total_keys = self.store.keys(&admin_pattern()).await?.len();
        let info = self.store.info().await?;

        Ok(CacheStats {
            total_keys,
            memory_usage: info
                .used_memory_human
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            hit_ratio: info
                .hit_ratio()
                .map(|ratio| format!("{:.2}%", ratio * 100.0))
                .unwrap_or_else(|| "N/A".to_string()),
        })
    }
}
