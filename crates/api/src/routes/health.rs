//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::{metrics, store_health, HealthStatus};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Pings the store and reports.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = store::health::report_health(state.store.as_ref()).await;
    let status = HealthStatus::from_connected(connected);
    let code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status: status.as_str().to_string(),
            store_backend: state.store.backend().to_string(),
            store_connected: connected,
            online_users: metrics().online_users.get(),
        }),
    )
}

/// GET /health/ready - Ready once the last store ping succeeded.
pub async fn ready_handler() -> StatusCode {
    if store_health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - The process is serving requests.
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
