//! HTTP API layer for the presence engine.

pub mod extractors;
pub mod middleware;
pub mod presentation;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
