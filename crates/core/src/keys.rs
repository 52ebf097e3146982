//! Store key namespace.
//!
//! Each component owns its own prefix and never reads another's keys.

use crate::context::UserId;

/// Sorted set of user id -> last seen epoch seconds.
pub const ONLINE_USERS_KEY: &str = "online_users";

/// Prefix of the per-user activity metadata hashes.
pub const USER_ACTIVITY_PREFIX: &str = "user_activity:";

/// Newest-first list of JSON activity entries.
pub const ACTIVITY_LOG_KEY: &str = "activity_log";

/// Prefix of admin cache entries.
pub const ADMIN_PREFIX: &str = "admin:";

/// Hash fields of the activity metadata.
pub const FIELD_LAST_SEEN: &str = "last_seen";
pub const FIELD_IP_ADDRESS: &str = "ip_address";
pub const FIELD_USER_AGENT: &str = "user_agent";

pub fn user_activity_key(user_id: UserId) -> String {
    format!("{}{}", USER_ACTIVITY_PREFIX, user_id)
}

pub fn admin_key(name: &str) -> String {
    format!("{}{}", ADMIN_PREFIX, name)
}

pub fn admin_config_key(name: &str) -> String {
    format!("{}config:{}", ADMIN_PREFIX, name)
}

/// Glob matching every admin cache key.
pub fn admin_pattern() -> String {
    format!("{}*", ADMIN_PREFIX)
}
