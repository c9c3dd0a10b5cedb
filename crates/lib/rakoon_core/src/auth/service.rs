//! Credential service: signup, login, logout, refresh and account lifecycle.

use std::sync::Arc;

use tracing::{info, warn};

use super::password::{MAX_HASH_INPUT, PasswordHasher, salted};
use super::salt::{SALT_LENGTH, generate_salt};
use super::store::CredentialStore;
use super::token::{TokenCodec, now_ms};
use super::{AuthError, TokenError};
use crate::config::{AuthSettings, ConfigError};
use crate::models::auth::{
    AuthenticatedSubject, CredentialRecord, IssuedToken, NewCredential, PublicUser, TokenClaims,
};

/// Orchestrates the store, the hasher and the token codec.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    hasher: PasswordHasher,
}

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>, settings: &AuthSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            codec: TokenCodec::new(settings)?,
            hasher: PasswordHasher::new(settings.bcrypt_cost),
        })
    }

    // -----------------------------------------------------------------------
    // Account lifecycle
    // -----------------------------------------------------------------------

    /// Create an account and return its first token.
    pub async fn sign_up(&self, name: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let name = validate_name(name)?;
        validate_password(password)?;

        if self.store.name_exists(name).await? {
            return Err(AuthError::Conflict);
        }

        let (password_hash, salt) = self.digest(password).await?;
        let id = self
            .store
            .create(NewCredential {
                name: name.to_string(),
                password_hash,
                salt,
            })
            .await?;

        info!(user_id = id, "user signed up");
        self.issue(id, false)
    }

    /// Check a name/password pair and hand out a token.
    pub async fn login(&self, name: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let record = self
            .store
            .find_by_name(name.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.check_password(password, &record).await? {
            warn!(user_id = record.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.store.record_login(record.id).await?;
        info!(user_id = record.id, "user logged in");
        self.issue(record.id, record.is_admin)
    }

    /// Invalidate every outstanding token of `id`. Idempotent.
    pub async fn logout(&self, id: i64) -> Result<(), AuthError> {
        self.store.set_reauth(id, true).await?;
        info!(user_id = id, "user logged out");
        Ok(())
    }

    /// Store a new salted hash and force a fresh login.
    pub async fn change_password(&self, id: i64, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let (password_hash, salt) = self.digest(new_password).await?;
        if !self.store.update_password(id, &password_hash, &salt).await? {
            return Err(AuthError::NotFound);
        }
        info!(user_id = id, "password changed");
        Ok(())
    }

    /// Soft delete.
    pub async fn archive(&self, id: i64) -> Result<(), AuthError> {
        if !self.store.archive(id).await? {
            return Err(AuthError::NotFound);
        }
        info!(user_id = id, "user archived");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AuthError> {
        if !self.store.delete(id).await? {
            return Err(AuthError::NotFound);
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn profile(&self, id: i64) -> Result<PublicUser, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::NotFound)
    }

    pub async fn rename(&self, id: i64, new_name: &str) -> Result<(), AuthError> {
        let new_name = validate_name(new_name)?;
        if !self.store.rename(id, new_name).await? {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>, AuthError> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .map(PublicUser::from)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    /// Full token check: signature and expiry, then the subject's current state.
    pub async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.codec.verify(token)?;
        let record = self.subject(claims.id).await?;
        if record.reauth {
            return Err(TokenError::ReauthRequired.into());
        }
        Ok(claims)
    }

    /// Resolve the identity behind a bearer token.
    pub async fn verify_access(&self, token: &str) -> Result<AuthenticatedSubject, AuthError> {
        let claims = self.verify(token).await?;
        Ok(AuthenticatedSubject {
            id: claims.id,
            is_admin: claims.is_admin,
        })
    }

    /// Exchange a correctly signed token, expired or not, for a fresh one.
    ///
    /// Past the refresh window the subject is forced to log in again.
    pub async fn refresh(&self, token: &str) -> Result<IssuedToken, AuthError> {
        let claims = self.codec.decode(token)?;

        if !self.codec.within_refresh_window(&claims, now_ms()) {
            self.store.set_reauth(claims.id, true).await?;
            warn!(user_id = claims.id, "refresh window exceeded, reauthentication forced");
            return Err(TokenError::RefreshWindowExpired.into());
        }

        let record = self.subject(claims.id).await?;
        if record.reauth {
            return Err(TokenError::ReauthRequired.into());
        }

        self.issue(record.id, record.is_admin)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn issue(&self, user_id: i64, is_admin: bool) -> Result<IssuedToken, AuthError> {
        Ok(IssuedToken {
            user_id,
            is_admin,
            token: self.codec.issue(user_id, is_admin)?,
        })
    }

    async fn subject(&self, id: i64) -> Result<CredentialRecord, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::Token(TokenError::SubjectMissing))
    }

    /// Fresh salt plus bcrypt digest, computed on the blocking pool.
    async fn digest(&self, password: &str) -> Result<(String, String), AuthError> {
        let salt = generate_salt(SALT_LENGTH);
        let input = salted(password, &salt);
        let hasher = self.hasher;
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&input))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))??;
        Ok((hash, salt))
    }

    async fn check_password(
        &self,
        password: &str,
        record: &CredentialRecord,
    ) -> Result<bool, AuthError> {
        let input = salted(password, &record.salt);
        let digest = record.password_hash.clone();
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&input, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task: {e}")))
    }
}

fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::MalformedInput("name must not be empty".into()));
    }
    Ok(name)
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::MalformedInput("password must not be empty".into()));
    }
    // The stored salt is appended before hashing and must fit too.
    if password.len() + SALT_LENGTH > MAX_HASH_INPUT {
        return Err(AuthError::MalformedInput(format!(
            "password must be at most {} bytes",
            MAX_HASH_INPUT - SALT_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryCredentialStore;
    use chrono::Duration;

    fn settings() -> AuthSettings {
        let mut settings = AuthSettings::new("service-secret").unwrap();
        settings.bcrypt_cost = 4;
        settings
    }

    fn service_with(settings: &AuthSettings) -> (CredentialService, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = CredentialService::new(store.clone(), settings).unwrap();
        (service, store)
    }

    fn service() -> (CredentialService, Arc<MemoryCredentialStore>) {
        service_with(&settings())
    }

    fn token_err(result: Result<impl std::fmt::Debug, AuthError>) -> TokenError {
        match result {
            Err(AuthError::Token(e)) => e,
            other => panic!("expected token error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sign_up_issues_verifiable_token() {
        let (service, store) = service();
        let issued = service.sign_up("alice", "pw").await.unwrap();

        let subject = service.verify_access(&issued.token).await.unwrap();
        assert_eq!(subject.id, issued.user_id);
        assert!(!subject.is_admin);

        let record = store.find_by_id(issued.user_id).await.unwrap().unwrap();
        assert_eq!(record.salt.len(), SALT_LENGTH);
        assert_ne!(record.password_hash, "pw");
        assert!(!record.reauth);
    }

    #[tokio::test]
    async fn duplicate_sign_up_conflicts() {
        let (service, _) = service();
        service.sign_up("alice", "pw").await.unwrap();
        assert!(matches!(
            service.sign_up("alice", "anything").await,
            Err(AuthError::Conflict)
        ));
    }

    #[tokio::test]
    async fn empty_fields_are_malformed_input() {
        let (service, _) = service();
        assert!(matches!(
            service.sign_up("  ", "pw").await,
            Err(AuthError::MalformedInput(_))
        ));
        assert!(matches!(
            service.sign_up("bob", "").await,
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[tokio::test]
    async fn overlong_passwords_are_rejected() {
        let (service, _) = service();
        let longest = "a".repeat(MAX_HASH_INPUT - SALT_LENGTH);

        assert!(matches!(
            service.sign_up("alice", &format!("{longest}b")).await,
            Err(AuthError::MalformedInput(_))
        ));
        assert!(matches!(
            service
                .sign_up("alice", &format!("{}REAL-SECRET-TAIL", "a".repeat(72)))
                .await,
            Err(AuthError::MalformedInput(_))
        ));

        let issued = service.sign_up("alice", &longest).await.unwrap();
        assert!(service.login("alice", &longest).await.is_ok());
        assert!(matches!(
            service
                .login("alice", &format!("{longest}totally-different"))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.change_password(issued.user_id, &format!("{longest}b")).await,
            Err(AuthError::MalformedInput(_))
        ));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (service, _) = service();
        service.sign_up("alice", "pw").await.unwrap();

        let unknown = service.login("nobody", "pw").await.unwrap_err();
        let wrong = service.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn logout_invalidates_outstanding_tokens_until_next_login() {
        let (service, _) = service();
        let first = service.sign_up("alice", "pw").await.unwrap();
        let second = service.login("alice", "pw").await.unwrap();

        service.logout(first.user_id).await.unwrap();
        service.logout(first.user_id).await.unwrap();

        assert_eq!(token_err(service.verify(&first.token).await), TokenError::ReauthRequired);
        assert_eq!(token_err(service.verify(&second.token).await), TokenError::ReauthRequired);

        let fresh = service.login("alice", "pw").await.unwrap();
        assert!(service.verify(&fresh.token).await.is_ok());
    }

    #[tokio::test]
    async fn login_clears_reauth_and_stamps_last_login() {
        let (service, store) = service();
        let issued = service.sign_up("alice", "pw").await.unwrap();
        service.logout(issued.user_id).await.unwrap();
        let before = store.find_by_id(issued.user_id).await.unwrap().unwrap();

        service.login("alice", "pw").await.unwrap();
        let after = store.find_by_id(issued.user_id).await.unwrap().unwrap();
        assert!(!after.reauth);
        assert!(after.last_login >= before.last_login);
    }

    #[tokio::test]
    async fn change_password_forces_reauth_and_swaps_credentials() {
        let (service, store) = service();
        let issued = service.sign_up("alice", "old").await.unwrap();
        let old_salt = store.find_by_id(issued.user_id).await.unwrap().unwrap().salt;

        service.change_password(issued.user_id, "new").await.unwrap();

        let record = store.find_by_id(issued.user_id).await.unwrap().unwrap();
        assert!(record.reauth);
        assert_ne!(record.salt, old_salt);
        assert_eq!(token_err(service.verify(&issued.token).await), TokenError::ReauthRequired);
        assert!(matches!(
            service.login("alice", "old").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(service.login("alice", "new").await.is_ok());
    }

    #[tokio::test]
    async fn archived_user_cannot_log_in() {
        let (service, _) = service();
        let issued = service.sign_up("alice", "pw").await.unwrap();
        service.archive(issued.user_id).await.unwrap();

        assert_eq!(token_err(service.verify(&issued.token).await), TokenError::ReauthRequired);
        assert!(matches!(
            service.login("alice", "pw").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn deleted_subject_is_missing() {
        let (service, _) = service();
        let issued = service.sign_up("alice", "pw").await.unwrap();
        service.delete(issued.user_id).await.unwrap();

        assert_eq!(
            token_err(service.verify_access(&issued.token).await),
            TokenError::SubjectMissing
        );
        assert!(matches!(service.delete(issued.user_id).await, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_but_refreshable() {
        let mut settings = settings();
        settings.token_validity = Duration::zero();
        let (service, _) = service_with(&settings);
        let issued = service.sign_up("alice", "pw").await.unwrap();

        assert_eq!(token_err(service.verify(&issued.token).await), TokenError::Expired);
        let refreshed = service.refresh(&issued.token).await.unwrap();
        assert_eq!(refreshed.user_id, issued.user_id);
    }

    #[tokio::test]
    async fn refresh_outside_window_forces_reauth() {
        let mut settings = settings();
        settings.refresh_limit = Duration::zero();
        let (service, store) = service_with(&settings);
        let issued = service.sign_up("alice", "pw").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert_eq!(
            token_err(service.refresh(&issued.token).await),
            TokenError::RefreshWindowExpired
        );
        assert!(store.find_by_id(issued.user_id).await.unwrap().unwrap().reauth);
    }

    #[tokio::test]
    async fn refresh_picks_up_admin_promotion() {
        let (service, store) = service();
        let issued = service.sign_up("alice", "pw").await.unwrap();
        assert!(store.set_admin(issued.user_id, true).await);

        let refreshed = service.refresh(&issued.token).await.unwrap();
        assert!(refreshed.is_admin);
        let subject = service.verify_access(&refreshed.token).await.unwrap();
        assert!(subject.is_admin);
    }

    #[tokio::test]
    async fn refresh_after_logout_requires_reauth() {
        let (service, _) = service();
        let issued = service.sign_up("alice", "pw").await.unwrap();
        service.logout(issued.user_id).await.unwrap();
        assert_eq!(
            token_err(service.refresh(&issued.token).await),
            TokenError::ReauthRequired
        );
    }

    #[tokio::test]
    async fn rename_and_profile() {
        let (service, _) = service();
        let alice = service.sign_up("alice", "pw").await.unwrap();
        service.sign_up("bob", "pw").await.unwrap();

        assert!(matches!(
            service.rename(alice.user_id, "bob").await,
            Err(AuthError::Conflict)
        ));
        service.rename(alice.user_id, "alicia").await.unwrap();
        assert_eq!(service.profile(alice.user_id).await.unwrap().name, "alicia");
        assert_eq!(service.list_users().await.unwrap().len(), 2);
    }
}
