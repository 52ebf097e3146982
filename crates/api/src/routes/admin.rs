//! Admin dashboard endpoints.
//!
//! These degrade per field instead of failing the whole response, except
//! where an operator action needs to know it did not happen.

use axum::{
    extract::{Query, State},
    Json,
};
use presence_core::limits::ADMIN_ONLINE_ACTIVITY_MAX_LIMIT;
use serde::Deserialize;
use tracing::{info, warn};
use tracker::{user_stats, CacheStats, OnlineUserActivity};

use super::page_size;
use crate::presentation::{last_activity_label, online_label};
use crate::response::{AdminUserRow, ApiError, ClearedResponse, DashboardResponse, ListResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

/// GET /admin/users - User table with online status and last activity.
pub async fn users_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<AdminUserRow>>, ApiError> {
    let now = state.clock.now();
    let mut rows = Vec::new();

    for user in state.users.all().await? {
        let online = state.presence.is_user_online(user.id).await;
        let activity = state.presence.user_activity(user.id).await;

        rows.push(AdminUserRow {
            online_status: online_label(&online).to_string(),
            last_activity: last_activity_label(&activity, now),
            id: user.id,
            name: user.name,
            email: user.email,
            status: user.status,
            created_at: user.created_at,
        });
    }

    Ok(Json(ListResponse::new(rows)))
}

/// GET /admin/dashboard - Headline counters, cached in process.
pub async fn dashboard_handler(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let online_users = state.dashboard.online_count(&state.presence).await;

    let total_users = state
        .dashboard
        .total_users(async { Ok(state.users.all().await?.len()) })
        .await?;

    let new_today = state
        .dashboard
        .today_registrations(async {
            let records = state.users.all().await?;
            Ok(user_stats(&records, state.clock.now(), state.offset).today_registrations)
        })
        .await?;

    Ok(Json(DashboardResponse {
        online_users,
        total_users,
        new_today,
    }))
}

/// GET /admin/online-activity?limit - Online users joined with their records.
pub async fn online_activity_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<ListResponse<OnlineUserActivity>>, ApiError> {
    let limit = page_size(params.limit, ADMIN_ONLINE_ACTIVITY_MAX_LIMIT);
    let joined = state
        .admin_cache
        .recent_online_activity(&state.presence, state.users.as_ref(), limit)
        .await?;
    Ok(Json(ListResponse::new(joined)))
}

/// GET /admin/cache/stats - Zeroed when the store cannot be queried.
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    let stats = state.admin_cache.cache_stats().await.unwrap_or_else(|e| {
        warn!(error = %e, "Cache stats unavailable");
        CacheStats::unavailable()
    });
    Json(stats)
}

/// DELETE /admin/cache - Drops every admin cache entry.
pub async fn clear_cache_handler(
    State(state): State<AppState>,
) -> Result<Json<ClearedResponse>, ApiError> {
    let cleared = state.admin_cache.clear_all().await?;
    state.dashboard.invalidate_all();
    info!(cleared, "Admin cache cleared");
    Ok(Json(ClearedResponse { cleared }))
}
