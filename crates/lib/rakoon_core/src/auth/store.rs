//! Credential persistence seam.
//!
//! The service talks to storage only through [`CredentialStore`]. Production
//! uses [`PgCredentialStore`](super::queries::PgCredentialStore); tests and
//! local runs can use [`MemoryCredentialStore`](super::memory::MemoryCredentialStore).

use async_trait::async_trait;

use super::AuthError;
use crate::models::auth::{CredentialRecord, NewCredential};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Active (non-archived) user by name.
    async fn find_by_name(&self, name: &str) -> Result<Option<CredentialRecord>, AuthError>;

    /// User by id, archived or not.
    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>, AuthError>;

    /// Whether any row, archived included, holds `name`.
    async fn name_exists(&self, name: &str) -> Result<bool, AuthError>;

    /// Insert a user with `reauth = false` and return its id.
    /// A taken name yields [`AuthError::Conflict`].
    async fn create(&self, user: NewCredential) -> Result<i64, AuthError>;

    /// Set `reauth`. Returns whether the user exists.
    async fn set_reauth(&self, id: i64, reauth: bool) -> Result<bool, AuthError>;

    /// Clear `reauth` and stamp `last_login`.
    async fn record_login(&self, id: i64) -> Result<bool, AuthError>;

    /// Replace hash and salt and force `reauth = true`.
    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, AuthError>;

    /// Change the login name. A taken name yields [`AuthError::Conflict`].
    async fn rename(&self, id: i64, name: &str) -> Result<bool, AuthError>;

    /// Stamp `archived_on` and force `reauth = true`.
    async fn archive(&self, id: i64) -> Result<bool, AuthError>;

    /// Remove the row.
    async fn delete(&self, id: i64) -> Result<bool, AuthError>;

    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError>;
}
