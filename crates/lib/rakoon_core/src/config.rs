//! Credential and token settings, resolved once at startup.

use std::fmt;

use chrono::Duration;
use thiserror::Error;

/// Default access token lifetime in minutes.
pub const DEFAULT_TOKEN_VALIDITY_MINUTES: u32 = 15;

/// Default refresh window in hours, counted from the token's `iat`.
pub const DEFAULT_TOKEN_LIMIT_HOURS: u32 = 24;

/// Default bcrypt work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// Errors raised while resolving settings. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SECRET_KEY is not defined")]
    MissingSecret,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings shared by the token codec and the password hasher.
#[derive(Clone)]
pub struct AuthSettings {
    /// HMAC signing secret. Never empty.
    pub secret: String,
    /// How long an issued token verifies.
    pub token_validity: Duration,
    /// How long after issuance a token may still be exchanged for a new one.
    pub refresh_limit: Duration,
    /// bcrypt cost factor.
    pub bcrypt_cost: u32,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("token_validity", &self.token_validity)
            .field("refresh_limit", &self.refresh_limit)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AuthSettings {
    /// Build settings with default durations and cost for the given secret.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self {
            secret,
            token_validity: Duration::minutes(DEFAULT_TOKEN_VALIDITY_MINUTES.into()),
            refresh_limit: Duration::hours(DEFAULT_TOKEN_LIMIT_HOURS.into()),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        })
    }

    /// Reads settings from environment variables.
    ///
    /// | Variable                 | Default    |
    /// |--------------------------|------------|
    /// | `SECRET_KEY`             | *required* |
    /// | `TOKEN_VALIDITY_MINUTES` | `15`       |
    /// | `TOKEN_LIMIT_HOURS`      | `24`       |
    /// | `BCRYPT_COST`            | `12`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthSettings::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SECRET_KEY").unwrap_or_default();
        let mut settings = Self::new(secret)?;

        if let Some(minutes) = parse_var(&lookup, "TOKEN_VALIDITY_MINUTES")? {
            settings.token_validity = Duration::minutes(minutes.into());
        }
        if let Some(hours) = parse_var(&lookup, "TOKEN_LIMIT_HOURS")? {
            settings.refresh_limit = Duration::hours(hours.into());
        }
        if let Some(cost) = parse_var(&lookup, "BCRYPT_COST")? {
            if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
                return Err(ConfigError::InvalidValue {
                    key: "BCRYPT_COST",
                    value: cost.to_string(),
                });
            }
            settings.bcrypt_cost = cost;
        }

        Ok(settings)
    }
}

/// Parse an optional unsigned variable; empty values count as unset.
fn parse_var<F>(lookup: &F, key: &'static str) -> Result<Option<u32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
