//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use presence_core::{UserActivity, UserId, UserStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

/// A list payload with its length.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// Presence of one user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserPresenceResponse {
    pub user_id: UserId,
    pub is_online: bool,
    pub activity: Option<UserActivity>,
}

/// Body of `POST /activities`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogActivityRequest {
    pub action: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// How many entries a delete removed.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedResponse {
    pub cleared: u64,
}

/// Headline numbers of the admin dashboard.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub online_users: usize,
    pub total_users: usize,
    pub new_today: usize,
}

/// One row of the admin user table.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminUserRow {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    /// "Online", "Offline" or "Unknown"
    pub online_status: String,
    /// Relative time of the last request, "Never" or "Error"
    pub last_activity: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_backend: String,
    pub store_connected: bool,
    pub online_users: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error carrying one of the engine's error codes.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND_001", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_001", msg)
    }

    pub fn validation(errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", "VALID_001").with_details(errors),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<presence_core::Error> for ApiError {
    fn from(err: presence_core::Error) -> Self {
        use presence_core::Error;

        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match &err {
            Error::Store { code, message, .. } => ApiError::with_code(status, *code, message),
            Error::Validation(msg) => ApiError::bad_request(msg),
            Error::NotFound(msg) => ApiError::not_found(msg),
            _ => {
                error!(error = %err, "Request failed");
                ApiError::internal("Internal error")
            }
        }
    }
}
