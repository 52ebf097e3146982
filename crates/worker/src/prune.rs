//! Periodic presence pruning.
//!
//! Reads already prune on their own; this keeps the online set small when
//! nobody is reading it.

use presence_core::{Error, Result};
use std::sync::Arc;
use store::SharedStore;
use tracing::{debug, info, warn};
use tracker::PresenceTracker;

/// Result of one prune pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: u64,
    pub online: usize,
}

pub struct PruneWorker {
    store: SharedStore,
    presence: Arc<PresenceTracker>,
}

impl PruneWorker {
    pub fn new(store: SharedStore, presence: Arc<PresenceTracker>) -> Self {
        Self { store, presence }
    }

    /// Probes the store, then prunes and refreshes the online gauge.
    pub async fn run(&self) -> Result<PruneReport> {
        if !store::health::report_health(self.store.as_ref()).await {
            warn!(backend = self.store.backend(), "Skipping prune, store unreachable");
            return Err(Error::store_unavailable("Store did not answer PING"));
        }

        let removed = self.presence.prune_offline().await?;
        let online = self.presence.online_users_count().await?;

        if removed > 0 {
            info!(removed, online, "Pruned offline users");
        } else {
            debug!(online, "Prune pass found nothing stale");
        }

        Ok(PruneReport { removed, online })
    }
}
