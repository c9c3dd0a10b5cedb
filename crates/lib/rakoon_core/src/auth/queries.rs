//! Auth-related database queries.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use super::store::CredentialStore;
use crate::models::auth::{CredentialRecord, NewCredential};

const USER_COLUMNS: &str = "id, name, password, salt, reauth, is_admin, \
     created_on, last_login, archived_on";

/// PostgreSQL-backed credential store.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique violation on `users.name` to a conflict.
fn conflict_or_db(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::Conflict,
        _ => AuthError::DbError(e),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let row = sqlx::query_as::<_, CredentialRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name = $1 AND archived_on IS NULL"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>, AuthError> {
        let row = sqlx::query_as::<_, CredentialRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn name_exists(&self, name: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, user: NewCredential) -> Result<i64, AuthError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (name, password, salt, reauth) VALUES ($1, $2, $3, false) \
             RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_db)
    }

    async fn set_reauth(&self, id: i64, reauth: bool) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET reauth = $1 WHERE id = $2")
            .bind(reauth)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_login(&self, id: i64) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET reauth = false, last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, AuthError> {
        let result =
            sqlx::query("UPDATE users SET password = $1, salt = $2, reauth = true WHERE id = $3")
                .bind(password_hash)
                .bind(salt)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rename(&self, id: i64, name: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(conflict_or_db)?;
        Ok(result.rows_affected() > 0)
    }

    async fn archive(&self, id: i64) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET archived_on = now(), reauth = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        let rows = sqlx::query_as::<_, CredentialRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
