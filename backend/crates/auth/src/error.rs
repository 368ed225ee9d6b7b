//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential check failed. Covers unknown user, wrong password and
    /// inactive account so the response never reveals which one it was.
    #[error("Unauthorized")]
    InvalidCredentials,

    /// Session cookie missing, malformed or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Provider redirect arrived without the delivery-preference cookies
    #[error("No callback parameter")]
    MissingCallback,

    /// Delivery-preference cookies were present but past their TTL
    #[error("No callback or already expired")]
    CallbackExpired,

    /// Provider handshake failed (state mismatch, token exchange, userinfo)
    #[error("Unauthorized")]
    HandshakeFailed(String),

    /// Auth strategy is not enabled in server settings
    #[error("Authentication method not enabled")]
    MethodNotEnabled,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::HandshakeFailed(_) => StatusCode::UNAUTHORIZED,
            AuthError::MissingCallback | AuthError::CallbackExpired => StatusCode::BAD_REQUEST,
            AuthError::MethodNotEnabled => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::HandshakeFailed(_) => ErrorKind::Unauthorized,
            AuthError::MissingCallback | AuthError::CallbackExpired => ErrorKind::BadRequest,
            AuthError::MethodNotEnabled => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::HandshakeFailed(detail) => {
                tracing::warn!(detail = %detail, "Provider handshake failed");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
