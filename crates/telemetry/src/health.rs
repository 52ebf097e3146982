//! Store probe results.
//!
//! Keeps the outcome of the latest store ping and the current failure
//! streak for the readiness probe and `/health`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn from_connected(connected: bool) -> Self {
        if connected {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Outcome of the most recent store ping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSnapshot {
    pub status: HealthStatus,
    /// Unset until the first probe runs
    pub last_checked: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct StoreHealth {
    probe: RwLock<ProbeSnapshot>,
}

impl StoreHealth {
    pub fn new() -> Self {
        Self {
            probe: RwLock::new(ProbeSnapshot {
                status: HealthStatus::Unhealthy,
                last_checked: None,
                consecutive_failures: 0,
                last_error: None,
            }),
        }
    }

    pub fn record_success(&self) {
        let mut probe = self.probe.write();
        probe.status = HealthStatus::Healthy;
        probe.last_checked = Some(Utc::now());
        probe.consecutive_failures = 0;
        probe.last_error = None;
    }

    pub fn record_failure(&self, error: impl Into<String>) {
        let mut probe = self.probe.write();
        probe.status = HealthStatus::Unhealthy;
        probe.last_checked = Some(Utc::now());
        probe.consecutive_failures = probe.consecutive_failures.saturating_add(1);
        probe.last_error = Some(error.into());
    }

    pub fn snapshot(&self) -> ProbeSnapshot {
        self.probe.read().clone()
    }

    /// Ready once a probe has succeeded and none has failed since.
    pub fn is_ready(&self) -> bool {
        self.probe.read().status.is_healthy()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.probe.read().consecutive_failures
    }
}

impl Default for StoreHealth {
    fn default() -> Self {
        Self::new()
    }
}

static STORE_HEALTH: LazyLock<StoreHealth> = LazyLock::new(StoreHealth::new);

/// Process-wide store probe record.
pub fn store_health() -> &'static StoreHealth {
    &STORE_HEALTH
}
