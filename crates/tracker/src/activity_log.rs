//! Capped, newest-first activity log.

use chrono::FixedOffset;
use presence_core::clock::{offset_from_secs, start_of_day};
use presence_core::keys::ACTIVITY_LOG_KEY;
use presence_core::limits::MAX_LOGS;
use presence_core::{
    ActivityEntry, ActivityStats, Clock, Error, RequestContext, Result, StoredActivity, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use store::SharedStore;
use telemetry::metrics;
use tracing::{debug, warn};
use uuid::Uuid;

/// Activity log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogConfig {
    /// Entries retained; older ones are evicted on write
    #[serde(default = "default_max_logs")]
    pub max_logs: usize,
    /// Offset of the deployment's time zone, used for "today"
    #[serde(default)]
    pub utc_offset_secs: i32,
}

fn default_max_logs() -> usize {
    MAX_LOGS
}

impl Default for ActivityLogConfig {
    fn default() -> Self {
        Self {
            max_logs: default_max_logs(),
            utc_offset_secs: 0,
        }
    }
}

pub struct ActivityLog {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    max_logs: usize,
    offset: FixedOffset,
}

impl ActivityLog {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, config: ActivityLogConfig) -> Self {
        Self {
            store,
            clock,
            max_logs: config.max_logs.max(1),
            offset: offset_from_secs(config.utc_offset_secs),
        }
    }

    pub fn max_logs(&self) -> usize {
        self.max_logs
    }

    /// Records an action, swallowing store failures.
    ///
    /// Logging must never break the caller; failures are counted and warned.
    pub async fn log(
        &self,
        action: &str,
        data: Option<&Value>,
        user_id: Option<UserId>,
        ctx: &RequestContext,
    ) {
        if let Err(e) = self.try_log(action, data, user_id, ctx).await {
            metrics().activity_log_failures.inc();
            warn!(action, error = %e, "Failed to record activity");
        }
    }

    /// Records an action and returns the stored entry.
    ///
    /// `user_id` falls back to the context's identity.
    pub async fn try_log(
        &self,
        action: &str,
        data: Option<&Value>,
        user_id: Option<UserId>,
        ctx: &RequestContext,
    ) -> Result<ActivityEntry> {
        if action.trim().is_empty() {
            return Err(Error::validation("Activity action must not be empty"));
        }

        let stored = StoredActivity::new(
            Uuid::new_v4().to_string(),
            action,
            data,
            ctx.resolve_user(user_id),
            ctx,
            self.clock.now(),
        )?;
        let payload = serde_json::to_string(&stored)?;

        self.store.lpush(ACTIVITY_LOG_KEY, payload).await?;
        self.store
            .ltrim(ACTIVITY_LOG_KEY, 0, self.max_logs as isize - 1)
            .await?;

        metrics().activities_logged.inc();
        debug!(action, id = %stored.id, "Recorded activity");

        stored
            .into_entry()
            .ok_or_else(|| Error::internal("Recorded activity could not be decoded"))
    }

    /// A page of entries, newest first.
    pub async fn recent_activities(&self, limit: usize, offset: usize) -> Result<Vec<ActivityEntry>> {
        // Offsets past isize::MAX would wrap into tail-relative indices.
        let Ok(start) = isize::try_from(offset) else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = offset.saturating_add(limit).min(isize::MAX as usize) as isize - 1;
        let raw = self.store.lrange(ACTIVITY_LOG_KEY, start, stop).await?;
        Ok(decode_entries(raw))
    }

    /// The user's entries among the retained log, newest first.
    pub async fn user_activities(&self, user_id: UserId, limit: usize) -> Result<Vec<ActivityEntry>> {
        Ok(self
            .retained()
            .await?
            .into_iter()
            .filter(|entry| entry.user_id == Some(user_id))
            .filter_map(StoredActivity::into_entry)
            .take(limit)
            .collect())
    }

    /// Case-insensitive substring search over action, IP address, and the
    /// serialized payload.
    pub async fn search_activities(&self, query: &str, limit: usize) -> Result<Vec<ActivityEntry>> {
        let needle = query.to_lowercase();
        Ok(self
            .retained()
            .await?
            .into_iter()
            .filter(|entry| entry.matches(&needle))
            .filter_map(StoredActivity::into_entry)
            .take(limit)
            .collect())
    }

    /// Aggregates over the whole retained log.
    pub async fn activity_stats(&self) -> Result<ActivityStats> {
        let entries: Vec<ActivityEntry> = self
            .retained()
            .await?
            .into_iter()
            .filter_map(StoredActivity::into_entry)
            .collect();
        let day_start = start_of_day(self.clock.now(), self.offset);
        Ok(ActivityStats::compute(&entries, day_start))
    }

    /// Drops the whole log.
    pub async fn clear_logs(&self) -> Result<()> {
        self.store.del(&[ACTIVITY_LOG_KEY.to_string()]).await?;
        debug!("Cleared activity log");
        Ok(())
    }

    pub async fn len(&self) -> Result<u64> {
        self.store.llen(ACTIVITY_LOG_KEY).await
    }

    async fn retained(&self) -> Result<Vec<StoredActivity>> {
        let raw = self
            .store
            .lrange(ACTIVITY_LOG_KEY, 0, self.max_logs as isize - 1)
            .await?;
        Ok(parse_stored(raw))
    }
}

fn parse_stored(raw: Vec<String>) -> Vec<StoredActivity> {
    raw.into_iter()
        .filter_map(|payload| {
            let parsed = StoredActivity::parse(&payload);
            if parsed.is_none() {
                metrics().malformed_entries_skipped.inc();
                warn!(len = payload.len(), "Skipping malformed activity entry");
            }
            parsed
        })
        .collect()
}

fn decode_entries(raw: Vec<String>) -> Vec<ActivityEntry> {
    parse_stored(raw)
        .into_iter()
        .filter_map(StoredActivity::into_entry)
        .collect()
}
