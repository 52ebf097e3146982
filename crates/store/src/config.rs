//! Store configuration.

use serde::{Deserialize, Serialize};

/// Which store implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

/// Store client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Connection timeout in milliseconds
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Per-command response timeout in milliseconds
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Redis
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_connection_timeout_ms() -> u64 {
    5000
}

fn default_response_timeout_ms() -> u64 {
    2000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            redis_url: default_redis_url(),
            connection_timeout_ms: default_connection_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// In-memory configuration, used in development and tests.
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Self::default()
        }
    }
}
