//! Authentication and credential logic.
//!
//! Provides salting, password hashing, the signed token codec, the credential
//! store seam and the service that ties them together.

pub mod memory;
pub mod password;
pub mod queries;
pub mod salt;
pub mod service;
pub mod store;
pub mod token;

use thiserror::Error;

/// Reasons a presented token is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("No token provided")]
    MissingToken,

    #[error("Bad token")]
    Malformed,

    #[error("Bad signature")]
    BadSignature,

    #[error("Token expired.")]
    Expired,

    #[error("Please reconnect.")]
    ReauthRequired,

    #[error("Token has expired and cannot be refreshed, please reconnect")]
    RefreshWindowExpired,

    #[error("User id in token payload does not exist.")]
    SubjectMissing,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect input data: {0}")]
    MalformedInput(String),

    #[error("Conflict: username already taken.")]
    Conflict,

    /// Unknown name and wrong password share this variant.
    #[error("Incorrect user name or password.")]
    InvalidCredentials,

    #[error("User does not exist.")]
    NotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
