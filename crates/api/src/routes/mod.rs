//! API routes.

pub mod activity;
pub mod admin;
pub mod health;
pub mod presence;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use presence_core::limits::DEFAULT_PAGE_SIZE;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::track_user_activity;
use crate::state::AppState;

/// Creates the API router.
///
/// Every route except the health probes and the heartbeat (which marks the
/// caller itself) refreshes the caller's presence.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let tracked = Router::new()
        .route("/presence/online", get(presence::online_users_handler))
        .route("/presence/online/count", get(presence::online_count_handler))
        .route("/presence/online/details", get(presence::online_details_handler))
        .route("/presence/users/:id", get(presence::user_presence_handler))
        .route(
            "/activities",
            get(activity::recent_handler)
                .post(activity::log_handler)
                .delete(activity::clear_handler),
        )
        .route("/activities/search", get(activity::search_handler))
        .route("/activities/stats", get(activity::stats_handler))
        .route("/users/:id/activities", get(activity::user_activities_handler))
        .route("/admin/users", get(admin::users_handler))
        .route("/admin/dashboard", get(admin::dashboard_handler))
        .route("/admin/online-activity", get(admin::online_activity_handler))
        .route("/admin/cache/stats", get(admin::cache_stats_handler))
        .route("/admin/cache", axum::routing::delete(admin::clear_cache_handler))
        .route_layer(from_fn_with_state(state.clone(), track_user_activity));

    Router::new()
        .merge(tracked)
        .route("/presence/heartbeat", post(presence::heartbeat_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Requested page size, defaulting to [`DEFAULT_PAGE_SIZE`] and capped at `max`.
pub(crate) fn page_size(requested: Option<usize>, max: usize) -> usize {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).min(max)
}
