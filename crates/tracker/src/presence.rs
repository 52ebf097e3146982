//! Online presence tracking.
//!
//! Two structures per deployment:
//! - `online_users`: sorted set of user id scored by last-seen epoch seconds
//! - `user_activity:{id}`: hash of last seen, IP, and user agent, expiring
//!   at twice the threshold so abandoned entries free themselves
//!
//! A user is online while `now - last_seen < threshold`. Entries at or below
//! the cutoff are pruned on every mark and every listing.

use chrono::{TimeZone, Utc};
use presence_core::keys::{
    user_activity_key, FIELD_IP_ADDRESS, FIELD_LAST_SEEN, FIELD_USER_AGENT, ONLINE_USERS_KEY,
};
use presence_core::limits::{
    ACTIVITY_TTL_FACTOR, DEFAULT_ONLINE_THRESHOLD_SECS, MAX_ONLINE_THRESHOLD_SECS,
};
use presence_core::{non_empty, Clock, Error, OnlineUser, RequestContext, Result, UserActivity, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use store::SharedStore;
use telemetry::metrics;
use tracing::{debug, warn};

/// Presence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Seconds without a refresh before a user counts as offline
    #[serde(default = "default_threshold_secs")]
    pub threshold_secs: u64,
}

fn default_threshold_secs() -> u64 {
    DEFAULT_ONLINE_THRESHOLD_SECS
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            threshold_secs: default_threshold_secs(),
        }
    }
}

impl PresenceConfig {
    /// Threshold must be between 1 second and [`MAX_ONLINE_THRESHOLD_SECS`].
    pub fn validate(&self) -> Result<()> {
        if (1..=MAX_ONLINE_THRESHOLD_SECS).contains(&self.threshold_secs) {
            Ok(())
        } else {
            Err(Error::config(format!(
                "presence.threshold_secs must be between 1 and {}, got {}",
                MAX_ONLINE_THRESHOLD_SECS, self.threshold_secs
            )))
        }
    }
}

/// Tracks who is online.
pub struct PresenceTracker {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    config: PresenceConfig,
}

impl PresenceTracker {
    /// Out-of-range thresholds are clamped into `1..=MAX_ONLINE_THRESHOLD_SECS`.
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, mut config: PresenceConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "Clamping presence threshold");
            config.threshold_secs = config.threshold_secs.clamp(1, MAX_ONLINE_THRESHOLD_SECS);
        }
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.config.threshold_secs)
    }

    /// Scores at or below this are stale.
    fn cutoff(&self) -> i64 {
        self.clock.timestamp() - self.config.threshold_secs as i64
    }

    /// Records that a user was just seen.
    ///
    /// Falls back to the context's identity when `user_id` is `None` and does
    /// nothing for anonymous requests. The steps are not transactional; a
    /// failure part way leaves state that the next mark repairs.
    pub async fn mark_user_online(
        &self,
        user_id: Option<UserId>,
        ctx: &RequestContext,
    ) -> Result<()> {
        let Some(user_id) = ctx.resolve_user(user_id) else {
            return Ok(());
        };

        let now = self.clock.timestamp();
        let member = user_id.to_string();
        let activity_key = user_activity_key(user_id);

        self.store
            .zadd(ONLINE_USERS_KEY, &member, now as f64)
            .await?;

        // Absent values are written as empty strings so the hash is fully replaced.
        self.store
            .hset_multiple(
                &activity_key,
                &[
                    (FIELD_LAST_SEEN, now.to_string()),
                    (FIELD_IP_ADDRESS, ctx.ip_address.clone().unwrap_or_default()),
                    (FIELD_USER_AGENT, ctx.user_agent.clone().unwrap_or_default()),
                ],
            )
            .await?;

        self.store
            .expire(&activity_key, self.threshold() * ACTIVITY_TTL_FACTOR as u32)
            .await?;

        self.prune_offline().await?;

        metrics().presence_marks.inc();
        debug!(user_id, last_seen = now, "Marked user online");
        Ok(())
    }

    /// Removes stale entries from the online set; returns how many went.
    pub async fn prune_offline(&self) -> Result<u64> {
        let removed = self
            .store
            .zrem_range_by_score(ONLINE_USERS_KEY, f64::NEG_INFINITY, self.cutoff() as f64)
            .await?;

        metrics().presence_prunes.inc();
        if removed > 0 {
            metrics().presence_pruned_entries.inc_by(removed);
            debug!(removed, "Pruned offline users");
        }
        Ok(removed)
    }

    /// Online user ids, most recently active first.
    pub async fn online_users(&self) -> Result<Vec<UserId>> {
        self.prune_offline().await?;

        let members = self.store.zrevrange(ONLINE_USERS_KEY, 0, -1).await?;
        let ids: Vec<UserId> = members
            .into_iter()
            .filter_map(|member| match member.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(member = %member, "Ignoring non-numeric member in online set");
                    None
                }
            })
            .collect();

        metrics().online_users.set(ids.len() as u64);
        Ok(ids)
    }

    pub async fn online_users_count(&self) -> Result<usize> {
        Ok(self.online_users().await?.len())
    }

    /// Whether the user was seen within the threshold. Does not prune.
    pub async fn is_user_online(&self, user_id: UserId) -> Result<bool> {
        let score = self
            .store
            .zscore(ONLINE_USERS_KEY, &user_id.to_string())
            .await?;
        Ok(score.is_some_and(|last_seen| last_seen > self.cutoff() as f64))
    }

    /// Last recorded activity, or `None` once the metadata has expired.
    pub async fn user_activity(&self, user_id: UserId) -> Result<Option<UserActivity>> {
        let mut fields = self
            .store
            .hmget(
                &user_activity_key(user_id),
                &[FIELD_LAST_SEEN, FIELD_IP_ADDRESS, FIELD_USER_AGENT],
            )
            .await?
            .into_iter();

        let last_seen = fields
            .next()
            .flatten()
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
        let Some(last_seen) = last_seen else {
            return Ok(None);
        };

        let ip_address = non_empty(fields.next().flatten());
        let user_agent = non_empty(fields.next().flatten());

        Ok(Some(UserActivity {
            last_seen,
            ip_address,
            user_agent,
            is_online: self.is_user_online(user_id).await?,
        }))
    }

    /// Online users joined with their activity, most recent first.
    ///
    /// Users still in the online set whose metadata already expired are left
    /// out rather than reported with partial data.
    pub async fn online_users_with_details(&self) -> Result<Vec<OnlineUser>> {
        let mut users = Vec::new();
        for user_id in self.online_users().await? {
            if let Some(activity) = self.user_activity(user_id).await? {
                users.push(OnlineUser { user_id, activity });
            }
        }
        Ok(users)
    }
}
