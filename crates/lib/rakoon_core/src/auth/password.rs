//! Password hashing via bcrypt.
//!
//! Callers pass the plaintext already concatenated with the stored salt.
//! bcrypt adds its own random salt on top, so two hashes of the same input differ.
//! bcrypt reads at most 72 bytes; longer input is an error here, never truncated.

use tracing::debug;

use super::AuthError;

/// Largest salted input bcrypt can digest without dropping bytes.
pub const MAX_HASH_INPUT: usize = 72;

/// bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a salted password.
    pub fn hash(&self, salted: &str) -> Result<String, AuthError> {
        bcrypt::non_truncating_hash(salted, self.cost)
            .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
    }

    /// Check a salted password against a digest. A malformed digest or an
    /// overlong input never matches.
    pub fn verify(&self, salted: &str, digest: &str) -> bool {
        match bcrypt::non_truncating_verify(salted, digest) {
            Ok(matches) => matches,
            Err(e) => {
                debug!(error = %e, "password check failed");
                false
            }
        }
    }
}

/// Join a plaintext password and its salt the way stored digests expect.
pub fn salted(password: &str, salt: &str) -> String {
    format!("{password}{salt}")
}
