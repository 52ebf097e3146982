//! Worker scheduler for background tasks.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use store::SharedStore;
use tokio::time::interval;
use tracing::{error, info};
use tracker::PresenceTracker;

use crate::prune::PruneWorker;

/// Worker scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between prune passes
    #[serde(default = "default_interval_secs")]
    pub prune_interval_secs: u64,
    /// Seconds between metrics snapshots
    #[serde(default = "default_interval_secs")]
    pub metrics_interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            prune_interval_secs: default_interval_secs(),
            metrics_interval_secs: default_interval_secs(),
        }
    }
}

impl WorkerConfig {
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs.max(1))
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(1))
    }
}

/// Background worker scheduler.
pub struct WorkerScheduler {
    config: WorkerConfig,
    store: SharedStore,
    presence: Arc<PresenceTracker>,
}

impl WorkerScheduler {
    pub fn new(config: WorkerConfig, store: SharedStore, presence: Arc<PresenceTracker>) -> Self {
        Self {
            config,
            store,
            presence,
        }
    }

    /// Starts all background workers.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_prune_worker().await;
        }));

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_metrics_reporter().await;
        }));

        info!(
            prune_interval_secs = self.config.prune_interval().as_secs(),
            metrics_interval_secs = self.config.metrics_interval().as_secs(),
            "Background workers started"
        );
        handles
    }

    async fn run_prune_worker(&self) {
        let worker = PruneWorker::new(self.store.clone(), self.presence.clone());
        let mut ticker = interval(self.config.prune_interval());

        loop {
            ticker.tick().await;

            if let Err(e) = worker.run().await {
                error!("Prune worker error: {}", e);
            }
        }
    }

    async fn run_metrics_reporter(&self) {
        use telemetry::metrics;

        let mut ticker = interval(self.config.metrics_interval());

        loop {
            ticker.tick().await;

            let snapshot = metrics().snapshot();
            info!(
                presence_marks = snapshot.presence_marks,
                presence_pruned_entries = snapshot.presence_pruned_entries,
                online_users = snapshot.online_users,
                activities_logged = snapshot.activities_logged,
                activity_log_failures = snapshot.activity_log_failures,
                malformed_entries_skipped = snapshot.malformed_entries_skipped,
                store_errors = snapshot.store_errors,
                store_latency_mean_ms = snapshot.store_latency_mean_ms,
                dashboard_cache_hits = snapshot.dashboard_cache_hits,
                dashboard_cache_misses = snapshot.dashboard_cache_misses,
                "Metrics snapshot"
            );
        }
    }
}
