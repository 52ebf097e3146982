//! Mock implementations for testing.

use async_trait::async_trait;
use presence_core::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use store::{MemoryStore, Store, StoreInfo};

/// Store whose every command fails as if Redis were down.
///
/// Exercises the error paths of the trackers and the degraded labels of the
/// admin views without stopping a real server.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl FailingStore {
    pub fn new() -> Self {
        Self
    }

    fn refused<T>(&self) -> Result<T> {
        Err(Error::store_unavailable("Connection refused"))
    }
}

#[async_trait]
impl Store for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn ping(&self) -> Result<()> {
        self.refused()
    }

    async fn zadd(&self, _key: &str, _member: &str, _score: f64) -> Result<()> {
        self.refused()
    }

    async fn zrem_range_by_score(&self, _key: &str, _min: f64, _max: f64) -> Result<u64> {
        self.refused()
    }

    async fn zrevrange(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>> {
        self.refused()
    }

    async fn zscore(&self, _key: &str, _member: &str) -> Result<Option<f64>> {
        self.refused()
    }

    async fn hset_multiple(&self, _key: &str, _fields: &[(&str, String)]) -> Result<()> {
        self.refused()
    }

    async fn hmget(&self, _key: &str, _fields: &[&str]) -> Result<Vec<Option<String>>> {
        self.refused()
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
        self.refused()
    }

    async fn lpush(&self, _key: &str, _value: String) -> Result<u64> {
        self.refused()
    }

    async fn ltrim(&self, _key: &str, _start: isize, _stop: isize) -> Result<()> {
        self.refused()
    }

    async fn lrange(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>> {
        self.refused()
    }

    async fn llen(&self, _key: &str) -> Result<u64> {
        self.refused()
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.refused()
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
        self.refused()
    }

    async fn del(&self, _keys: &[String]) -> Result<u64> {
        self.refused()
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>> {
        self.refused()
    }

    async fn info(&self) -> Result<StoreInfo> {
        self.refused()
    }
}

/// Embedded store that counts sorted-set writes, one per presence mark.
pub struct CountingStore {
    inner: MemoryStore,
    zadds: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            zadds: AtomicUsize::new(0),
        }
    }

    pub fn zadd_calls(&self) -> usize {
        self.zadds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for CountingStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.zadds.fetch_add(1, Ordering::SeqCst);
        self.inner.zadd(key, member, score).await
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.inner.zrem_range_by_score(key, min, max).await
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.inner.zrevrange(key, start, stop).await
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.inner.zscore(key, member).await
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<()> {
        self.inner.hset_multiple(key, fields).await
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        self.inner.hmget(key, fields).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.inner.expire(key, ttl).await
    }

    async fn lpush(&self, key: &str, value: String) -> Result<u64> {
        self.inner.lpush(key, value).await
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        self.inner.ltrim(key, start, stop).await
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.inner.lrange(key, start, stop).await
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.inner.llen(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.inner.set_ex(key, value, ttl).await
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        self.inner.del(keys).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.inner.keys(pattern).await
    }

    async fn info(&self) -> Result<StoreInfo> {
        self.inner.info().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_store_reports_unavailable() {
        let store = FailingStore::new();
        let err = store.ping().await.unwrap_err();
        assert!(err.is_store_error());
        assert_eq!(err.error_code(), "STORE_001");
        assert!(store.lrange("activity_log", 0, -1).await.is_err());
    }
}
