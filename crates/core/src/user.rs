//! User records owned by the external user store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::UserId;

/// Account status as kept by the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// A user as exposed by the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

/// Aggregate user counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_users: usize,
    pub active_users: usize,
    pub inactive_users: usize,
    pub today_registrations: usize,
    pub this_month_registrations: usize,
}
