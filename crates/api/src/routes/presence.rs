//! Presence endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use presence_core::{OnlineUser, UserId};
use tracing::debug;

use crate::extractors::ClientContext;
use crate::response::{ApiError, CountResponse, ListResponse, UserPresenceResponse};
use crate::state::AppState;

/// GET /presence/online - Online user ids, most recent first.
pub async fn online_users_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<UserId>>, ApiError> {
    let users = state.presence.online_users().await?;
    Ok(Json(ListResponse::new(users)))
}

/// GET /presence/online/count
pub async fn online_count_handler(
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.presence.online_users_count().await?;
    Ok(Json(CountResponse { count }))
}

/// GET /presence/online/details
pub async fn online_details_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<OnlineUser>>, ApiError> {
    let users = state.presence.online_users_with_details().await?;
    Ok(Json(ListResponse::new(users)))
}

/// GET /presence/users/:id
pub async fn user_presence_handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserPresenceResponse>, ApiError> {
    let is_online = state.presence.is_user_online(user_id).await?;
    let activity = state.presence.user_activity(user_id).await?;

    Ok(Json(UserPresenceResponse {
        user_id,
        is_online,
        activity,
    }))
}

/// POST /presence/heartbeat - Refreshes the caller's presence.
pub async fn heartbeat_handler(
    State(state): State<AppState>,
    ClientContext(ctx): ClientContext,
) -> Result<Json<UserPresenceResponse>, ApiError> {
    let Some(user_id) = ctx.user_id else {
        return Err(ApiError::bad_request("Heartbeat requires the X-User-Id header"));
    };

    state.presence.mark_user_online(Some(user_id), &ctx).await?;
    debug!(user_id, "Heartbeat");

    Ok(Json(UserPresenceResponse {
        user_id,
        is_online: true,
        activity: state.presence.user_activity(user_id).await?,
    }))
}
