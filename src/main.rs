//! ATRAC Conversion Server
//!
//! A small HTTP service that turns uploaded audio into ATRAC3 (LP2/LP4) and
//! back. The heavy lifting is done by external programs: `psp_at3tool.exe`
//! under Wine for ATRAC3 and `ffmpeg` for loudness normalization, replaygain
//! and resampling.

mod config;
mod config_file;
mod conversion;
mod error;
mod http;
mod scratch;
mod state;
mod tools;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::config_file::ConfigFile;
use crate::error::{AtracError, Result};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "atrac-server";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    if config_path == "--default-config" {
        println!("{}", ConfigFile::default_config().to_toml()?);
        return Ok(());
    }

    // Load configuration before logging so the configured level applies
    let loaded = config_file::load(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => ServerConfig::default(),
    };

    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Err(e) = &loaded {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }
    tracing::info!("Configuration loaded: {:?}", config);

    // Create application state
    let state = Arc::new(AppState::new(config.clone())?);
    let purged = state.scratch.purge_stale()?;
    if purged > 0 {
        tracing::info!("Removed {} stale scratch file(s)", purged);
    }
    tracing::info!(
        scratch_dir = %state.scratch.path().display(),
        encoder = %config.tools.encoder.program,
        transcoder = %config.tools.transcoder.program,
        timeout_secs = state.tools.runner.timeout().as_secs(),
        "Scratch directory and tools ready"
    );

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| AtracError::Config(format!("invalid listen address: {}", e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("atrac_server={},tower_http={}", config.log_level, config.log_level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
