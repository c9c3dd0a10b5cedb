//! API server configuration.

use rakoon_core::config::{AuthSettings, ConfigError};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8081").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Token and password settings.
    pub auth: AuthSettings,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable       | Default                              |
    /// |----------------|--------------------------------------|
    /// | `BIND_ADDR`    | `127.0.0.1:8081`                     |
    /// | `DATABASE_URL` | `postgres://localhost:5432/rakoon`   |
    ///
    /// plus the variables read by [`AuthSettings::from_env`]. A missing
    /// `SECRET_KEY` is an error: the server must not start without one.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8081".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/rakoon".into()),
            auth: AuthSettings::from_env()?,
        })
    }
}
