//! Key-value store abstraction for the presence engine.
//!
//! The trackers only see [`Store`]; production runs against Redis, tests and
//! local development against the embedded [`MemoryStore`].

pub mod config;
pub mod health;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::*;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::*;

use presence_core::{Clock, Result};
use std::sync::Arc;
use tracing::info;

/// Builds the configured store.
pub async fn connect(config: &StoreConfig, clock: Arc<dyn Clock>) -> Result<SharedStore> {
    let store: SharedStore = match config.backend {
        StoreBackend::Redis => Arc::new(RedisStore::connect(config).await?),
        StoreBackend::Memory => Arc::new(MemoryStore::with_clock(clock)),
    };
    info!(backend = store.backend(), "Store ready");
    Ok(store)
}
