//! Store health checks.

use crate::store::Store;
use tracing::{debug, error};

/// Ping the store and record the outcome in the process-wide probe record.
pub async fn report_health(store: &dyn Store) -> bool {
    let health = telemetry::store_health();
    match store.ping().await {
        Ok(()) => {
            debug!(backend = store.backend(), "Store connection healthy");
            health.record_success();
            true
        }
        Err(e) => {
            health.record_failure(e.to_string());
            error!(
                backend = store.backend(),
                consecutive_failures = health.consecutive_failures(),
                "Store health check failed: {}",
                e
            );
            false
        }
    }
}
