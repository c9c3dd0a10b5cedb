//! # rakoon_api
//!
//! HTTP API library for Rakoon.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use rakoon_core::auth::service::CredentialService;
use rakoon_core::auth::store::CredentialStore;
use rakoon_core::config::ConfigError;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, ping, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Credential service over the configured store.
    pub service: CredentialService,
}

impl AppState {
    /// Wire the credential service to a store. Fails on an unusable secret.
    pub fn new(config: ApiConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
        let service = CredentialService::new(store, &config.auth)?;
        Ok(Self { config, service })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `rakoon_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    rakoon_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required). Refresh checks its own token.
    let public = Router::new()
        .route(routes::GET_PING, get(ping::ping))
        .route(routes::POST_USER, post(auth::signup_handler))
        .route(routes::POST_USER_CONNECT, post(auth::login_handler))
        .route(routes::POST_USER_LOGIN, post(auth::login_handler))
        .route(routes::POST_REFRESH_TOKEN, post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            routes::USER_ID,
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(routes::PUT_USER_ID_LOGOUT, put(auth::logout_handler))
        .route(routes::PUT_USER_ID_PASSWORD, put(users::update_password_handler))
        .route(routes::PUT_USER_ID_ARCHIVE, put(users::archive_user_handler))
        .route(routes::GET_USERS, get(users::list_users_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
