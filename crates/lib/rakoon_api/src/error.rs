//! Application error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rakoon_core::auth::{AuthError, TokenError};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Internal server error")]
    Internal(String),
}

fn token_status(e: TokenError) -> (StatusCode, &'static str) {
    match e {
        TokenError::MissingToken => (StatusCode::FORBIDDEN, "missing_token"),
        TokenError::Malformed => (StatusCode::FORBIDDEN, "bad_token"),
        TokenError::BadSignature => (StatusCode::FORBIDDEN, "bad_signature"),
        TokenError::SubjectMissing => (StatusCode::FORBIDDEN, "subject_missing"),
        TokenError::Expired => (StatusCode::UNAUTHORIZED, "token_expired"),
        TokenError::ReauthRequired => (StatusCode::UNAUTHORIZED, "reauth_required"),
        TokenError::RefreshWindowExpired => (StatusCode::UNAUTHORIZED, "refresh_window_expired"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.clone()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.clone()),
            AppError::Token(e) => {
                let (status, error) = token_status(*e);
                (status, error, e.to_string())
            }
            AppError::Internal(cause) => {
                error!(%cause, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MalformedInput(msg) => AppError::Validation(msg),
            AuthError::Conflict => AppError::Conflict(AuthError::Conflict.to_string()),
            AuthError::InvalidCredentials => {
                AppError::NotFound(AuthError::InvalidCredentials.to_string())
            }
            AuthError::NotFound => AppError::NotFound(AuthError::NotFound.to_string()),
            AuthError::Token(t) => AppError::Token(t),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Incorrect input data: {}", rejection.body_text()))
    }
}
