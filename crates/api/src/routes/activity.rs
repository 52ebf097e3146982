//! Activity log endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use presence_core::{ActivityEntry, ActivityStats, UserId};
use serde::Deserialize;
use tracing::info;

use super::page_size;
use crate::extractors::ClientContext;
use crate::response::{ApiError, ClearedResponse, ListResponse, LogActivityRequest};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// GET /activities?limit&offset - Newest first.
pub async fn recent_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ActivityEntry>>, ApiError> {
    let limit = page_size(params.limit, state.activity.max_logs());
    let entries = state
        .activity
        .recent_activities(limit, params.offset.unwrap_or(0))
        .await?;
    Ok(Json(ListResponse::new(entries)))
}

/// POST /activities - Records an action for the caller or an explicit user.
pub async fn log_handler(
    State(state): State<AppState>,
    ClientContext(ctx): ClientContext,
    Json(request): Json<LogActivityRequest>,
) -> Result<(StatusCode, Json<ActivityEntry>), ApiError> {
    let entry = state
        .activity
        .try_log(&request.action, request.data.as_ref(), request.user_id, &ctx)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /activities - Drops the whole log.
pub async fn clear_handler(
    State(state): State<AppState>,
) -> Result<Json<ClearedResponse>, ApiError> {
    let cleared = state.activity.len().await?;
    state.activity.clear_logs().await?;
    info!(cleared, "Activity log cleared");
    Ok(Json(ClearedResponse { cleared }))
}

/// GET /activities/search?q&limit
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ListResponse<ActivityEntry>>, ApiError> {
    let Some(query) = params.q else {
        return Err(ApiError::bad_request("Missing query parameter `q`"));
    };
    let limit = page_size(params.limit, state.activity.max_logs());
    let entries = state.activity.search_activities(&query, limit).await?;
    Ok(Json(ListResponse::new(entries)))
}

/// GET /activities/stats
pub async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<ActivityStats>, ApiError> {
    Ok(Json(state.activity.activity_stats().await?))
}

/// GET /users/:id/activities?limit
pub async fn user_activities_handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<ActivityEntry>>, ApiError> {
    let limit = page_size(params.limit, state.activity.max_logs());
    let entries = state.activity.user_activities(user_id, limit).await?;
    Ok(Json(ListResponse::new(entries)))
}
