//! Read access to the user store.
//!
//! Users live outside the engine; the dashboard only needs lookups and
//! registration counts.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use parking_lot::RwLock;
use presence_core::clock::start_of_day;
use presence_core::{Error, Result, UserId, UserRecord, UserStats, UserStatus};
use std::collections::BTreeMap;
use std::path::Path;

/// Source of user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Records for the ids that exist, in the order requested.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<UserRecord>> {
        let mut users = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(user) = self.find(id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn all(&self) -> Result<Vec<UserRecord>>;
}

/// Directory held in memory, optionally seeded from a JSON file.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<BTreeMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// Loads a JSON array of user records.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Cannot read {}: {e}", path.display())))?;
        let records: Vec<UserRecord> = serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("Invalid users file {}: {e}", path.display())))?;
        Ok(Self::from_records(records))
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.users.read().values().cloned().collect())
    }
}

/// Status and registration counts as of `now`, with calendar boundaries in
/// the given offset.
pub fn user_stats(users: &[UserRecord], now: DateTime<Utc>, offset: FixedOffset) -> UserStats {
    let day_start = start_of_day(now, offset);
    let local_now = now.with_timezone(&offset);

    let mut stats = UserStats {
        total_users: users.len(),
        ..Default::default()
    };

    for user in users {
        match user.status {
            UserStatus::Active => stats.active_users += 1,
            UserStatus::Inactive => stats.inactive_users += 1,
        }

        if user.created_at >= day_start && user.created_at <= now {
            stats.today_registrations += 1;
        }

        let created = user.created_at.with_timezone(&offset);
        if created.year() == local_now.year() && created.month() == local_now.month() {
            stats.this_month_registrations += 1;
        }
    }

    stats
}
