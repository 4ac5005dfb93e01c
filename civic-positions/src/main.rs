//! civic-positions - position history and bulk import service
//!
//! Serves the position history ledger (assign, end term, current holder,
//! timeline) and spreadsheet imports over HTTP + SSE.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use civic_common::config::{
    default_config_path, read_toml_config, resolve_root_folder, RootFolderInitializer, TomlConfig,
};
use civic_common::events::EventBus;
use civic_positions::config::ImportConfig;
use civic_positions::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "127.0.0.1:5780";

/// Command-line arguments for civic-positions
#[derive(Parser, Debug)]
#[command(name = "civic-positions")]
#[command(about = "Position history and bulk import service")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "CIVIC_POSITIONS_BIND")]
    bind: Option<String>,

    /// TOML config file (defaults to <config_dir>/civic/civic-positions.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Read the config file if one is given or present at the default location
fn load_config(path: Option<&PathBuf>) -> Result<Option<TomlConfig>> {
    match path {
        Some(path) => Ok(Some(read_toml_config(path)?)),
        None => match default_config_path("civic-positions") {
            Some(path) if path.exists() => Ok(Some(read_toml_config(&path)?)),
            _ => Ok(None),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_config(args.config.as_ref())?;

    let default_level = toml_config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Build identification first, before any database delay
    info!("Starting civic-positions v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), toml_config.as_ref());
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let import_config = ImportConfig::resolve(toml_config.as_ref())?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = civic_positions::db::init_database_pool(&db_path, import_config.max_lock_wait())
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let event_bus = EventBus::new(1000);
    let state = AppState::new(pool, event_bus, import_config);
    let app = build_router(state);

    let bind = args
        .bind
        .or_else(|| toml_config.as_ref().and_then(|c| c.bind_address.clone()))
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
