//! Rakoon user service server binary.
//!
//! Resolves configuration from the environment (optionally via `.env`),
//! migrates the database and serves the HTTP API until interrupted.

use std::sync::Arc;

use clap::Parser;
use rakoon_api::AppState;
use rakoon_api::config::ApiConfig;
use rakoon_core::auth::queries::PgCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments. Flags override the matching environment variables.
#[derive(Parser, Debug)]
#[command(name = "rakoon_api_server", about = "Rakoon user service")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR")]
    bind_addr: Option<String>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Skip embedded migrations at startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rakoon_api=debug,rakoon_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    // Fails without SECRET_KEY: no token may be signed with a missing secret.
    let mut config = ApiConfig::from_env()?;
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        auth = ?config.auth,
        "starting rakoon_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    if args.skip_migrations {
        info!("skipping database migrations");
    } else {
        info!("running database migrations");
        rakoon_api::migrate(&pool).await?;
    }

    let store = Arc::new(PgCredentialStore::new(pool));
    let state = AppState::new(config, store)?;
    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    let app = rakoon_api::router(state);

    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received, shutting down");
        })
        .await?;

    Ok(())
}
