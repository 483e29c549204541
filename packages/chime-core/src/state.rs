//! Runtime configuration for the Chime server.
//!
//! Everything tunable lives in one explicit [`Config`] struct passed at
//! startup - there are no ambient globals. The defaults match the
//! conventional deployment: a RAM-backed cache directory and `aplay` as the
//! output primitive.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Server configuration: ports, paths, and acknowledgment tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port the TCP listener binds to.
    pub bind_port: u16,

    /// Directory holding cached clips, keyed by sanitized client keys.
    /// Conventionally a RAM-backed volume, so entries vanish on reboot.
    pub cache_dir: PathBuf,

    /// Scratch file handed to the player for every clip. A single fixed path
    /// is safe because playback is serialized process-wide.
    pub scratch_path: PathBuf,

    /// Extra milliseconds added to every declared duration before
    /// acknowledging, absorbing playback-start latency.
    pub safety_margin_ms: u64,

    /// Player command invoked with the scratch path appended
    /// (fire-and-forget, e.g. `aplay -q`).
    pub player_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_port: 30001,
            cache_dir: PathBuf::from("/dev/shm/chime_cache"),
            scratch_path: PathBuf::from("/dev/shm/chime_play.wav"),
            safety_margin_ms: 0,
            player_command: "aplay".to_string(),
        }
    }
}
