//! Chime Server - audio playback acknowledgment daemon.
//!
//! Speech-synthesis pipelines fire pre-rendered clips at this daemon over
//! TCP; it plays them through the local audio output and acknowledges only
//! after playback has plausibly completed, so callers never race against
//! overlapping sound or acknowledge-too-early bugs.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chime_core::{AudioSink, ClipCache, CommandSink, Player};
use clap::Parser;
use tokio::signal;

use crate::config::ServerConfig;

/// Chime Server - TCP audio playback with completion acknowledgment.
#[derive(Parser, Debug)]
#[command(name = "chime-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "CHIME_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "CHIME_BIND_PORT")]
    port: Option<u16>,

    /// Cache directory for stored clips (overrides config file).
    #[arg(short = 'd', long, env = "CHIME_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Player command, e.g. "aplay -q" (overrides config file).
    #[arg(long, env = "CHIME_PLAYER_COMMAND")]
    player: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Chime Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(cache_dir) = args.cache_dir {
        config.cache_dir = cache_dir;
    }
    if let Some(player) = args.player {
        config.player_command = player;
    }

    log::info!(
        "Configuration: bind_port={}, cache_dir={}, scratch={}, safety_margin={}ms, player={:?}",
        config.bind_port,
        config.cache_dir.display(),
        config.scratch_path.display(),
        config.safety_margin_ms,
        config.player_command
    );

    let core_config = config.to_core_config();
    let cache = Arc::new(ClipCache::new(&core_config.cache_dir));
    let sink: Arc<dyn AudioSink> = Arc::new(CommandSink::new(core_config.player_command.as_str()));
    let player = Arc::new(Player::new(
        &core_config.scratch_path,
        core_config.safety_margin_ms,
        sink,
    ));

    // Spawn the accept loop; it runs until aborted at shutdown.
    let server_handle = tokio::spawn(async move {
        if let Err(e) = chime_core::run(&core_config, cache, player).await {
            log::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, closing listener");
    server_handle.abort();

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
