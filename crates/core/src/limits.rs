//! Thresholds and caps.

/// Seconds without a refresh after which a user is offline.
pub const DEFAULT_ONLINE_THRESHOLD_SECS: u64 = 300;

/// Largest accepted online threshold (30 days).
pub const MAX_ONLINE_THRESHOLD_SECS: u64 = 30 * 86_400;

/// Activity metadata outlives sorted-set membership by this factor.
pub const ACTIVITY_TTL_FACTOR: u64 = 2;

/// Maximum retained activity log entries.
pub const MAX_LOGS: usize = 1000;

/// Default page size for activity queries.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Number of actions reported in activity statistics.
pub const MAX_TOP_ACTIONS: usize = 5;

/// Default admin cache TTL (1 hour).
pub const ADMIN_CACHE_DEFAULT_TTL_SECS: u64 = 3600;

/// TTL of the cached online-activity join (5 minutes).
pub const ADMIN_ONLINE_ACTIVITY_TTL_SECS: u64 = 300;

/// Largest page of the cached online-activity join; one cache key per limit.
pub const ADMIN_ONLINE_ACTIVITY_MAX_LIMIT: usize = 1000;
