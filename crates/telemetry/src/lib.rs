//! Telemetry for the presence engine: structured logging, in-process
//! metrics, and a component health registry.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
