//! Unified error types for the presence engine.
//!
//! Error codes:
//! - STORE_001-003: Store errors (unavailable, timeout, protocol)
//! - VALID_001: Validation errors
//! - NOT_FOUND_001: Missing resources at the API boundary

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// STORE_001: Store unreachable or the command failed
    Unavailable,
    /// STORE_002: Store did not answer in time
    Timeout,
    /// STORE_003: Store answered with an unexpected reply
    Protocol,
}

impl StoreErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "STORE_001",
            Self::Timeout => "STORE_002",
            Self::Protocol => "STORE_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unavailable => 503,
            Self::Timeout => 504,
            Self::Protocol => 502,
        }
    }
}

/// Unified error type for the presence engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Store error with code.
    #[error("[{code}] {message}")]
    Store {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a store error.
    pub fn store(code: StoreErrorCode, msg: impl Into<String>) -> Self {
        Self::Store {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::store(StoreErrorCode::Unavailable, msg)
    }

    pub fn store_timeout(msg: impl Into<String>) -> Self {
        Self::store(StoreErrorCode::Timeout, msg)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error came out of the store client.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Store { http_status, .. } => *http_status,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 500,
            Self::NotFound(_) => 404,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Store { code, .. } => code,
            Self::Validation(_) => "VALID_001",
            Self::NotFound(_) => "NOT_FOUND_001",
            Self::Serialization(_) | Self::Config(_) | Self::Internal(_) => "INTERNAL_001",
        }
    }
}
