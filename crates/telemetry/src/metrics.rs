//! In-process metrics.
//!
//! Plain atomics; the worker scheduler periodically logs a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Last observed value.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram in milliseconds.
#[derive(Debug)]
pub struct Histogram {
    buckets: [AtomicU64; 8],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    /// Upper bounds; the last bucket also takes everything above it.
    const BUCKET_BOUNDS: [u64; 8] = [1, 2, 5, 10, 25, 100, 500, 2000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }

    /// (upper bound, count) pairs.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Metrics for the presence engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Presence
    pub presence_marks: Counter,
    pub presence_prunes: Counter,
    pub presence_pruned_entries: Counter,
    pub online_users: Gauge,

    // Activity log
    pub activities_logged: Counter,
    pub activity_log_failures: Counter,
    pub malformed_entries_skipped: Counter,

    // Store
    pub store_errors: Counter,
    pub store_latency_ms: Histogram,

    // Dashboard cache
    pub dashboard_cache_hits: Counter,
    pub dashboard_cache_misses: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            presence_marks: self.presence_marks.get(),
            presence_prunes: self.presence_prunes.get(),
            presence_pruned_entries: self.presence_pruned_entries.get(),
            online_users: self.online_users.get(),
            activities_logged: self.activities_logged.get(),
            activity_log_failures: self.activity_log_failures.get(),
            malformed_entries_skipped: self.malformed_entries_skipped.get(),
            store_errors: self.store_errors.get(),
            store_latency_mean_ms: self.store_latency_ms.mean(),
            dashboard_cache_hits: self.dashboard_cache_hits.get(),
            dashboard_cache_misses: self.dashboard_cache_misses.get(),
        }
    }
}

/// Point-in-time copy of the metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub presence_marks: u64,
    pub presence_prunes: u64,
    pub presence_pruned_entries: u64,
    pub online_users: u64,
    pub activities_logged: u64,
    pub activity_log_failures: u64,
    pub malformed_entries_skipped: u64,
    pub store_errors: u64,
    pub store_latency_mean_ms: f64,
    pub dashboard_cache_hits: u64,
    pub dashboard_cache_misses: u64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
