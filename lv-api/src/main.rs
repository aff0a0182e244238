//! lv-api - HTTP API for the song catalog
//!
//! Serves listing, search and liked songs, and runs the daily crawl and
//! reconcile triggers when `[schedule] enabled = true`.

use anyhow::Result;
use clap::Parser;
use lv_api::triggers::spawn_triggers;
use lv_api::{build_router, AppState};
use lv_common::config::{AppConfig, Overrides};
use lv_common::db::{init_database, settings};
use lv_ingest::Crawler;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "lv-api")]
#[command(about = "HTTP API for the lyricvault song catalog")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "LYRICVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "LYRICVAULT_DATABASE")]
    database: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long, env = "LYRICVAULT_PORT")]
    port: Option<u16>,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LYRICVAULT_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_overrides(Overrides {
        database_path: args.database,
        port: args.port,
        log_level: args.log_level,
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting lv-api v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let token_secret = match config.auth.token_secret.clone() {
        Some(secret) => secret,
        None => settings::load_or_init_token_secret(&pool).await?,
    };

    let crawler = Crawler::from_config(&config, pool.clone())?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool.clone(), crawler, config, token_secret);

    let triggers = spawn_triggers(&state)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("lv-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for trigger in triggers {
        trigger.abort();
    }
    pool.close().await;
    info!("lv-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
