//! Presence tracking middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::extractors::ClientContext;
use crate::state::AppState;

/// Marks the caller online once the handler has produced its response.
///
/// Anonymous requests pass through untouched. Store failures are logged and
/// never change the response.
pub async fn track_user_activity(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ClientContext(ctx) = ClientContext::from_headers(request.headers());

    let response = next.run(request).await;

    if ctx.is_authenticated() {
        if let Err(e) = state.presence.mark_user_online(None, &ctx).await {
            warn!(user_id = ?ctx.user_id, error = %e, "Failed to mark user online");
        }
    }

    response
}
