//! Molar API server binary.
//!
//! Reads settings from flags, environment, and an optional `.env` file, then
//! serves the REST API until SIGINT or SIGTERM.

use std::sync::Arc;

use clap::Parser;
use molar_api::AppState;
use molar_api::config::{ApiConfig, Environment};
use molar_core::seed::{DEFAULT_SEED_PASSWORD, seed_staff};
use molar_core::store::memory::MemoryStore;
use molar_core::store::postgres::PgStore;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "molar_api_server", about = "Dental clinic staff API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 4000)]
    port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/molar"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Deployment environment: development, test, or production.
    ///
    /// Only development lets requests without a token through as the
    /// built-in manager identity.
    #[arg(long, env = "APP_ENV", default_value = "production")]
    environment: String,

    /// JWT signing secret. Required in production.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Access token lifetime, e.g. `1h` or `30m`.
    #[arg(long, env = "JWT_EXPIRES_IN", default_value = "1h")]
    access_token_ttl: String,

    /// Refresh token lifetime, e.g. `7d`.
    #[arg(long, env = "JWT_REFRESH_EXPIRES_IN", default_value = "7d")]
    refresh_token_ttl: String,

    /// Create the default manager, doctor, and assistant accounts if missing.
    #[arg(long, default_value_t = false)]
    seed: bool,

    /// Keep all data in memory instead of PostgreSQL. Implies `--seed`.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,molar_api=debug,molar_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let environment: Environment = args.environment.parse()?;
    let config = ApiConfig::new(
        environment,
        args.jwt_secret,
        &args.access_token_ttl,
        &args.refresh_token_ttl,
    )?;

    info!(%environment, port = args.port, "starting molar_api_server");
    if environment.allows_identity_bypass() {
        warn!("development mode: requests without a token run as the built-in manager");
    }

    let state = if args.in_memory {
        info!("using in-memory store");
        let store = Arc::new(MemoryStore::new());
        let created = seed_staff(store.as_ref(), DEFAULT_SEED_PASSWORD).await?;
        info!(created, "seeded staff accounts");
        AppState::new(config, store)?
    } else {
        info!(
            max_connections = args.max_connections,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        molar_api::migrate(&pool).await?;

        let store = Arc::new(PgStore::new(pool));
        if args.seed {
            let created = seed_staff(store.as_ref(), DEFAULT_SEED_PASSWORD).await?;
            info!(created, "seeded staff accounts");
        }
        AppState::new(config, store)?
    };

    let app = molar_api::router(state);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
