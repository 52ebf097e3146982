//! Presence tracking, activity logging, and admin dashboard caching.
//!
//! Every component takes a [`store::SharedStore`] and a [`presence_core::Clock`]
//! so it can run against Redis in production and the embedded store in tests.

pub mod activity_log;
pub mod admin_cache;
pub mod directory;
pub mod presence;

pub use activity_log::{ActivityLog, ActivityLogConfig};
pub use admin_cache::{AdminCache, CacheStats, OnlineUserActivity};
pub use directory::{user_stats, InMemoryUserDirectory, UserDirectory};
pub use presence::{PresenceConfig, PresenceTracker};
