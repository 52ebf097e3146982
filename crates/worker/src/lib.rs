//! Background workers for the presence engine.
//!
//! - Prune (drops stale presence entries, re-probes store health)
//! - Metrics reporter (logs a metrics snapshot)

pub mod prune;
pub mod scheduler;

pub use prune::PruneWorker;
pub use scheduler::*;
