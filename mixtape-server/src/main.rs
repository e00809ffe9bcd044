//! mixtape-server - Mixtape automation service
//!
//! Accepts uploaded tracks, builds crossfaded mixtapes and still-image videos
//! as background jobs, and generates timestamped tracklist descriptions.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mixtape_common::config::{resolve_data_folder, TomlConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mixtape_server::config::ServiceConfig;
use mixtape_server::AppState;

/// Command-line arguments for mixtape-server
#[derive(Parser, Debug)]
#[command(name = "mixtape-server")]
#[command(about = "Crossfade mixtape, video and description service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "MIXTAPE_PORT")]
    port: Option<u16>,

    /// Folder holding uploads and produced artifacts
    #[arg(short, long, env = "MIXTAPE_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "MIXTAPE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins; otherwise the config file's level for this crate
    let default_filter = format!(
        "mixtape_server={level},mixtape_common={level},tower_http=debug",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting mixtape-server v{} ({} {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), &toml_config);
    let port = args.port.unwrap_or(toml_config.port);
    let config = ServiceConfig::from_toml(&toml_config, data_folder, port);

    config
        .ensure_directories()
        .context("Failed to create output/upload directories")?;

    info!("Data folder: {}", config.data_folder.display());
    info!("Output dir: {}", config.output_dir.display());
    info!("Upload dir: {}", config.upload_dir.display());
    if config.allow_unscoped_downloads {
        info!("Unscoped downloads enabled: /download serves any readable path");
    }

    let app = mixtape_server::build_router(AppState::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

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
