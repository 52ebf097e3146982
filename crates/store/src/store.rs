//! The store contract consumed by the trackers.
//!
//! Mirrors the subset of Redis commands the engine relies on. Every method
//! maps to a single store command and is atomic per key; nothing spans keys.

use async_trait::async_trait;
use presence_core::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Server statistics relevant to the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreInfo {
    pub used_memory_human: Option<String>,
    pub keyspace_hits: Option<u64>,
    pub keyspace_misses: Option<u64>,
}

impl StoreInfo {
    /// Builds from `INFO` output (`key:value` lines, `#` section headers).
    pub fn parse(raw: &str) -> Self {
        let fields: HashMap<&str, &str> = raw
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| line.trim().split_once(':'))
            .collect();

        Self {
            used_memory_human: fields.get("used_memory_human").map(|v| v.to_string()),
            keyspace_hits: fields.get("keyspace_hits").and_then(|v| v.parse().ok()),
            keyspace_misses: fields.get("keyspace_misses").and_then(|v| v.parse().ok()),
        }
    }

    /// Fraction of key lookups that hit, if known and any lookups happened.
    pub fn hit_ratio(&self) -> Option<f64> {
        let hits = self.keyspace_hits?;
        let total = hits + self.keyspace_misses?;
        (total > 0).then(|| hits as f64 / total as f64)
    }
}

/// Key-value store with sorted sets, hashes, lists, and per-key expiry.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs and health reports.
    fn backend(&self) -> &'static str;

    /// PING.
    async fn ping(&self) -> Result<()>;

    // Sorted sets

    /// ZADD: insert or update `member` with `score`.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// ZREMRANGEBYSCORE with inclusive bounds; returns removed count.
    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64>;

    /// ZREVRANGE: members by descending score, inclusive index range.
    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// ZSCORE.
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;

    // Hashes

    /// HSET with several fields.
    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<()>;

    /// HMGET: one slot per requested field.
    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>>;

    /// EXPIRE: returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    // Lists

    /// LPUSH: returns the new length.
    async fn lpush(&self, key: &str, value: String) -> Result<u64>;

    /// LTRIM with inclusive index range.
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()>;

    /// LRANGE with inclusive index range.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// LLEN.
    async fn llen(&self, key: &str) -> Result<u64>;

    // Strings

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// SETEX.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    // Keyspace

    /// DEL: returns how many keys existed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// KEYS with a glob pattern (only `*` is interpreted by the embedded store).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// INFO.
    async fn info(&self) -> Result<StoreInfo>;
}

/// Shared store handle.
pub type SharedStore = Arc<dyn Store>;

/// Seconds of a TTL, never below one.
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
