//! idrec-svc - Identity Reconciliation service entry point
//!
//! Resolves configuration, opens the contact store and serves the HTTP API
//! until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use idrec_common::config::{ConfigOverrides, ServiceConfig};
use idrec_common::db::init_database;
use idrec_common::{ContactStore, MemoryContactStore, SqliteContactStore};
use idrec_svc::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for idrec-svc
#[derive(Parser, Debug)]
#[command(name = "idrec-svc")]
#[command(about = "Identity reconciliation service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "IDREC_PORT")]
    port: Option<u16>,

    /// Host address to bind
    #[arg(long, env = "IDREC_HOST")]
    host: Option<String>,

    /// Path to the SQLite database file
    #[arg(short, long, env = "IDREC_DATABASE")]
    database: Option<PathBuf>,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "IDREC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "IDREC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Keep contacts in memory instead of SQLite (lost on exit)
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServiceConfig::resolve(
        args.config.as_deref(),
        ConfigOverrides {
            host: args.host,
            port: args.port,
            database_path: args.database,
            log_level: args.log_level,
        },
    )
    .context("Failed to resolve configuration")?;

    // RUST_LOG wins over the configured level
    let level = &config.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("idrec_svc={level},idrec_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Identity Reconciliation (idrec-svc) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let state = if args.in_memory {
        info!("Using in-memory contact store");
        let store: Arc<dyn ContactStore> = Arc::new(MemoryContactStore::new());
        AppState::new(store, None)
    } else {
        info!("Database path: {}", config.database_path.display());
        let pool = init_database(&config.database_path)
            .await
            .context("Failed to initialize database")?;
        info!("✓ Connected to database");
        let store: Arc<dyn ContactStore> = Arc::new(SqliteContactStore::new(pool.clone()));
        AppState::new(store, Some(pool))
    };

    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("idrec-svc listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
