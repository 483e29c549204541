//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the TCP listener to.
    /// Override: `CHIME_BIND_PORT`
    pub bind_port: u16,

    /// Directory holding cached clips. Conventionally RAM-backed
    /// (`/dev/shm`) so the cache clears on reboot.
    /// Override: `CHIME_CACHE_DIR`
    pub cache_dir: PathBuf,

    /// Scratch file handed to the player for every clip.
    /// Override: `CHIME_SCRATCH_PATH`
    pub scratch_path: PathBuf,

    /// Extra milliseconds added to declared durations before acknowledging.
    /// Raise this (600-1200) if clients see clipped audio tails.
    /// Override: `CHIME_SAFETY_MARGIN_MS`
    pub safety_margin_ms: u64,

    /// Player command invoked with the scratch path appended.
    /// Override: `CHIME_PLAYER_COMMAND`
    pub player_command: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = chime_core::Config::default();
        Self {
            bind_port: core.bind_port,
            cache_dir: core.cache_dir,
            scratch_path: core.scratch_path,
            safety_margin_ms: core.safety_margin_ms,
            player_command: core.player_command,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHIME_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("CHIME_CACHE_DIR") {
            self.cache_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CHIME_SCRATCH_PATH") {
            self.scratch_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CHIME_SAFETY_MARGIN_MS") {
            if let Ok(margin) = val.parse() {
                self.safety_margin_ms = margin;
            }
        }

        if let Ok(val) = std::env::var("CHIME_PLAYER_COMMAND") {
            self.player_command = val;
        }
    }

    /// Converts to chime-core's Config type.
    pub fn to_core_config(&self) -> chime_core::Config {
        chime_core::Config {
            bind_port: self.bind_port,
            cache_dir: self.cache_dir.clone(),
            scratch_path: self.scratch_path.clone(),
            safety_margin_ms: self.safety_margin_ms,
            player_command: self.player_command.clone(),
        }
    }
}
