//! Request and response bodies.
//!
//! Every JSON body binds to an explicit struct; `validate` runs before the
//! request reaches the credential service.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Incorrect input data: '{field}' is required"
        )));
    }
    Ok(())
}

/// Body of `POST /v1/user` and `POST /v1/user/connect`.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub name: String,
    pub password: String,
}

impl CredentialsRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        require("password", &self.password)
    }
}

/// Body of `PUT /v1/user/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)
    }
}

/// Body of `PUT /v1/user/{id}/password`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("password", &self.password)
    }
}

/// Returned by signup and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub id: i64,
    pub token: String,
}

/// Returned by `POST /v1/refresh/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub message: String,
    pub user_id: i64,
    pub token: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"data": ...}` envelope for user reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
