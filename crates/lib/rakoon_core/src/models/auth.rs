//! Authentication domain models.
//!
//! `CredentialRecord` is internal: it carries the password hash and salt and is
//! never serialized. Anything sent to a client goes through `PublicUser`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user with credential fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRecord {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub salt: String,
    pub reauth: bool,
    pub is_admin: bool,
    pub created_on: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub archived_on: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    pub fn is_archived(&self) -> bool {
        self.archived_on.is_some()
    }
}

/// Fields required to insert a new user.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub name: String,
    pub password_hash: String,
    pub salt: String,
}

/// Client-facing view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub reauth: bool,
    pub is_admin: bool,
    pub created_on: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub archived_on: Option<DateTime<Utc>>,
}

impl From<CredentialRecord> for PublicUser {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            reauth: record.reauth,
            is_admin: record.is_admin,
            created_on: record.created_on,
            last_login: record.last_login,
            archived_on: record.archived_on,
        }
    }
}

/// Token header. Constant for this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims embedded in access tokens. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject user id.
    pub id: i64,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Identity resolved from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    pub id: i64,
    pub is_admin: bool,
}

/// Token handed out by signup, login and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub user_id: i64,
    pub is_admin: bool,
    pub token: String,
}
