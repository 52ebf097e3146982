//! Redis-backed store using a multiplexed, auto-reconnecting connection.

use crate::config::StoreConfig;
use crate::store::{ttl_secs, Store, StoreInfo};
use async_trait::async_trait;
use presence_core::{Error, Result, StoreErrorCode};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use std::future::Future;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, info, warn};

/// Redis store client.
///
/// `ConnectionManager` is cheap to clone and reconnects on its own, so each
/// command works on a clone of the shared handle.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    response_timeout: Duration,
}

impl RedisStore {
    /// Connects to Redis.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| Error::config(format!("Invalid Redis URL: {}", e)))?;

        let connect_timeout = Duration::from_millis(config.connection_timeout_ms);
        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                Error::store_timeout(format!(
                    "Timed out connecting to Redis after {:?}",
                    connect_timeout
                ))
            })?
            .map_err(|e| Error::store_unavailable(format!("Failed to connect to Redis: {}", e)))?;

        info!(
            response_timeout_ms = config.response_timeout_ms,
            "Connected to Redis"
        );

        Ok(Self {
            conn,
            response_timeout: Duration::from_millis(config.response_timeout_ms),
        })
    }

    /// Runs one command under the response timeout, recording latency and errors.
    async fn run<T, F>(&self, command: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        let start = Instant::now();
        let result = tokio::time::timeout(self.response_timeout, fut).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        metrics().store_latency_ms.observe(elapsed_ms);

        match result {
            Ok(Ok(value)) => {
                debug!(command, latency_ms = elapsed_ms, "Redis command ok");
                Ok(value)
            }
            Ok(Err(e)) => {
                metrics().store_errors.inc();
                warn!(command, error = %e, "Redis command failed");
                Err(map_redis_error(e))
            }
            Err(_) => {
                metrics().store_errors.inc();
                warn!(command, timeout = ?self.response_timeout, "Redis command timed out");
                Err(Error::store_timeout(format!(
                    "{} timed out after {:?}",
                    command, self.response_timeout
                )))
            }
        }
    }
}

fn map_redis_error(err: RedisError) -> Error {
    if err.is_timeout() {
        Error::store_timeout(err.to_string())
    } else if err.kind() == redis::ErrorKind::TypeError {
        Error::store(StoreErrorCode::Protocol, err.to_string())
    } else {
        Error::store_unavailable(err.to_string())
    }
}

#[async_trait]
impl Store for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let cmd = redis::cmd("PING");
        let _pong: String = self
            .run("PING", async move { cmd.query_async(&mut conn).await })
            .await?;
        Ok(())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        self.run("ZADD", async move { conn.zadd(key, member, score).await })
            .await
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut conn = self.conn.clone();
        self.run("ZREMRANGEBYSCORE", async move {
            conn.zrembyscore(key, min, max).await
        })
        .await
    }

    async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        self.run("ZREVRANGE", async move { conn.zrevrange(key, start, stop).await })
            .await
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut conn = self.conn.clone();
        self.run("ZSCORE", async move { conn.zscore(key, member).await })
            .await
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<()> {
        let mut conn = self.conn.clone();
        self.run("HSET", async move { conn.hset_multiple(key, fields).await })
            .await
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("HMGET");
        cmd.arg(key).arg(fields);
        self.run("HMGET", async move { cmd.query_async(&mut conn).await })
            .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let secs = ttl_secs(ttl) as i64;
        self.run("EXPIRE", async move { conn.expire(key, secs).await })
            .await
    }

    async fn lpush(&self, key: &str, value: String) -> Result<u64> {
        let mut conn = self.conn.clone();
        self.run("LPUSH", async move { conn.lpush(key, value).await })
            .await
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
        let mut conn = self.conn.clone();
        self.run("LTRIM", async move { conn.ltrim(key, start, stop).await })
            .await
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        self.run("LRANGE", async move { conn.lrange(key, start, stop).await })
            .await
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        self.run("LLEN", async move { conn.llen(key).await }).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.run("GET", async move { conn.get(key).await }).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let secs = ttl_secs(ttl);
        self.run("SETEX", async move { conn.set_ex(key, value, secs).await })
            .await
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        self.run("DEL", async move { conn.del(keys).await }).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        self.run("KEYS", async move { conn.keys(pattern).await })
            .await
    }

    async fn info(&self) -> Result<StoreInfo> {
        let mut conn = self.conn.clone();
        let cmd = redis::cmd("INFO");
        let raw: String = self
            .run("INFO", async move { cmd.query_async(&mut conn).await })
            .await?;
        Ok(StoreInfo::parse(&raw))
    }
}
