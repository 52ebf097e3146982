//! Activity log entries and aggregate statistics.
//!
//! Entries are stored as JSON objects, newest first. The stored form keeps
//! `data` as a serialized JSON string so that search can match against the
//! exact text that was written; the read form decodes it back into a value.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{RequestContext, UserId};
use crate::limits::MAX_TOP_ACTIONS;

/// Activity entry as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredActivity {
    pub id: String,
    pub user_id: Option<UserId>,
    pub action: String,
    pub data: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: i64,
    pub created_at: String,
}

impl StoredActivity {
    /// Builds a new entry stamped with `now`.
    pub fn new(
        id: impl Into<String>,
        action: impl Into<String>,
        data: Option<&Value>,
        user_id: Option<UserId>,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> crate::Result<Self> {
        let data = data.map(serde_json::to_string).transpose()?;
        Ok(Self {
            id: id.into(),
            user_id,
            action: action.into(),
            data,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            timestamp: now.timestamp(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        })
    }

    /// Leniently parses a stored entry.
    ///
    /// Returns `None` only when the payload is not a JSON object carrying a
    /// string `action`. Individual malformed fields are nulled out.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        let obj = value.as_object()?;
        let action = obj.get("action")?.as_str()?.to_string();

        let user_id = obj.get("user_id").and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });

        // Older writers may have stored the payload inline rather than as text.
        let data = obj.get("data").and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

        let string_field = |name: &str| obj.get(name).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            id: string_field("id").unwrap_or_default(),
            user_id,
            action,
            data,
            ip_address: string_field("ip_address"),
            user_agent: string_field("user_agent"),
            timestamp: obj.get("timestamp").and_then(Value::as_i64).unwrap_or_default(),
            created_at: string_field("created_at").unwrap_or_default(),
        })
    }

    /// Case-insensitive substring match on action, IP, or serialized data.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

        contains(&self.action)
            || self.ip_address.as_deref().is_some_and(contains)
            || self.data.as_deref().is_some_and(contains)
    }

    /// Decodes into the read model.
    ///
    /// `created_at` falls back to `timestamp` when it cannot be parsed; the
    /// entry is dropped when neither yields a time.
    pub fn into_entry(self) -> Option<ActivityEntry> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                (self.timestamp > 0)
                    .then(|| Utc.timestamp_opt(self.timestamp, 0).single())
                    .flatten()
            })?;

        let data = self
            .data
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());

        Some(ActivityEntry {
            id: self.id,
            user_id: self.user_id,
            action: self.action,
            data,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            timestamp: self.timestamp,
            created_at,
        })
    }
}

/// Activity entry as returned to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub user_id: Option<UserId>,
    pub action: String,
    pub data: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

/// Number of occurrences of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCount {
    pub action: String,
    pub count: usize,
}

/// Aggregate statistics over the retained log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_activities: usize,
    pub today_activities: usize,
    pub unique_users_count: usize,
    /// At most five actions, by descending count.
    pub top_actions: Vec<ActionCount>,
}

impl ActivityStats {
    /// Single pass over newest-first entries.
    ///
    /// Equal counts keep the order in which the action was first seen.
    pub fn compute(entries: &[ActivityEntry], day_start: DateTime<Utc>) -> Self {
        let mut today_activities = 0;
        let mut users = HashSet::new();
        let mut counts: Vec<ActionCount> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for entry in entries {
            if entry.created_at >= day_start {
                today_activities += 1;
            }

            if let Some(user_id) = entry.user_id {
                users.insert(user_id);
            }

            match index.get(entry.action.as_str()) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(entry.action.as_str(), counts.len());
                    counts.push(ActionCount {
                        action: entry.action.clone(),
                        count: 1,
                    });
                }
            }
        }

        // sort_by is stable
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(MAX_TOP_ACTIONS);

        Self {
            total_activities: entries.len(),
            today_activities,
            unique_users_count: users.len(),
            top_actions: counts,
        }
    }
}
