//! In-process credential store.
//!
//! Same contract as the Postgres store, kept in a map behind a `RwLock`.
//! Used by tests and by local runs without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::AuthError;
use super::store::CredentialStore;
use crate::models::auth::{CredentialRecord, NewCredential};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, CredentialRecord>,
}

impl Inner {
    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.name == name && Some(u.id) != except)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the admin flag. There is no HTTP route for this; admins are
    /// promoted directly in the store.
    pub async fn set_admin(&self, id: i64, is_admin: bool) -> bool {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.is_admin = is_admin;
                true
            }
            None => false,
        }
    }

    async fn update<F>(&self, id: i64, f: F) -> Result<bool, AuthError>
    where
        F: FnOnce(&mut CredentialRecord) + Send,
    {
        let mut inner = self.inner.write().await;
        Ok(match inner.users.get_mut(&id) {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.name == name && !u.is_archived())
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn name_exists(&self, name: &str) -> Result<bool, AuthError> {
        Ok(self.inner.read().await.name_taken(name, None))
    }

    async fn create(&self, user: NewCredential) -> Result<i64, AuthError> {
        let mut inner = self.inner.write().await;
        if inner.name_taken(&user.name, None) {
            return Err(AuthError::Conflict);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let now = Utc::now();
        inner.users.insert(
            id,
            CredentialRecord {
                id,
                name: user.name,
                password_hash: user.password_hash,
                salt: user.salt,
                reauth: false,
                is_admin: false,
                created_on: now,
                last_login: now,
                archived_on: None,
            },
        );
        Ok(id)
    }

    async fn set_reauth(&self, id: i64, reauth: bool) -> Result<bool, AuthError> {
        self.update(id, |u| u.reauth = reauth).await
    }

    async fn record_login(&self, id: i64) -> Result<bool, AuthError> {
        self.update(id, |u| {
            u.reauth = false;
            u.last_login = Utc::now();
        })
        .await
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, AuthError> {
        let password_hash = password_hash.to_string();
        let salt = salt.to_string();
        self.update(id, move |u| {
            u.password_hash = password_hash;
            u.salt = salt;
            u.reauth = true;
        })
        .await
    }

    async fn rename(&self, id: i64, name: &str) -> Result<bool, AuthError> {
        let mut inner = self.inner.write().await;
        if inner.name_taken(name, Some(id)) {
            return Err(AuthError::Conflict);
        }
        Ok(match inner.users.get_mut(&id) {
            Some(user) => {
                user.name = name.to_string();
                true
            }
            None => false,
        })
    }

    async fn archive(&self, id: i64) -> Result<bool, AuthError> {
        self.update(id, |u| {
            u.archived_on = Some(Utc::now());
            u.reauth = true;
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, AuthError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }
}
