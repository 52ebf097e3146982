//! Presence read models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::UserId;

/// Last known activity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    pub last_seen: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_online: bool,
}

/// An online user joined with its activity metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    pub user_id: UserId,
    pub activity: UserActivity,
}

/// Reads an optional hash field, treating empty strings as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
