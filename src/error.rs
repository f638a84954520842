/// Unified error types for the CraftLink backend
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Email already registered to another account
    #[error("Email already exists")]
    DuplicateEmail,

    /// Login failure; identical for unknown email and wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing or malformed bearer credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Access token failed verification; client should use the refresh flow
    #[error("Session expired, please login again")]
    SessionExpired,

    /// Refresh token failed verification or was superseded
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Not authorized to act on the target resource
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Image bridge or identity-provider failures
    #[error("Upstream dependency error: {0}")]
    Upstream(String),

    /// Image storage errors
    #[error("Image storage error: {0}")]
    ImageStorage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            ApiError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "DuplicateEmail",
                self.to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "InvalidCredentials",
                self.to_string(),
            ),
            ApiError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            ApiError::SessionExpired => (
                StatusCode::FORBIDDEN,
                "SessionExpired",
                self.to_string(),
            ),
            ApiError::InvalidRefreshToken => (
                StatusCode::FORBIDDEN,
                "InvalidRefreshToken",
                self.to_string(),
            ),
            ApiError::Authorization(_) => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                self.to_string(),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            ApiError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "UpstreamError",
                self.to_string(),
            ),
            ApiError::Database(_)
            | ApiError::Internal(_)
            | ApiError::Io(_)
            | ApiError::ImageStorage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Map a sqlx error onto the given conflict error when a unique index
/// rejected the write, otherwise pass it through as a database error.
pub fn map_unique_violation(err: sqlx::Error, conflict: ApiError) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => conflict,
        _ => ApiError::Database(err),
    }
}

/// Whether a sqlx error is a unique index violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
