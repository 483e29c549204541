//! Shared fixtures for cache, playback, and protocol tests.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio::time::Instant;

use crate::cache::ClipCache;
use crate::playback::{AudioSink, Player};

/// One clip handed to the sink, with the (tokio) instant playback started.
#[derive(Debug, Clone)]
pub(crate) struct RecordedPlay {
    pub clip: Vec<u8>,
    pub started_at: Instant,
}

/// Sink that records each clip instead of touching a sound device.
pub(crate) struct RecordingSink {
    plays: Mutex<Vec<RecordedPlay>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            plays: Mutex::new(Vec::new()),
        })
    }

    pub fn plays(&self) -> Vec<RecordedPlay> {
        self.plays.lock().unwrap().clone()
    }

    pub fn clips(&self) -> Vec<Vec<u8>> {
        self.plays().into_iter().map(|p| p.clip).collect()
    }

    pub fn play_count(&self) -> usize {
        self.plays.lock().unwrap().len()
    }
}

impl AudioSink for RecordingSink {
    fn play(&self, path: &Path) -> io::Result<()> {
        let clip = std::fs::read(path)?;
        self.plays.lock().unwrap().push(RecordedPlay {
            clip,
            started_at: Instant::now(),
        });
        Ok(())
    }
}

/// Cache + player rooted in a fresh temporary directory.
pub(crate) struct Fixture {
    pub cache: ClipCache,
    pub player: Arc<Player>,
    pub sink: Arc<RecordingSink>,
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_safety_margin(0)
    }

    pub fn with_safety_margin(safety_margin_ms: u64) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let sink = RecordingSink::new();
        let cache = ClipCache::new(dir.path().join("cache"));
        let player = Arc::new(Player::new(
            dir.path().join("scratch.wav"),
            safety_margin_ms,
            Arc::clone(&sink) as Arc<dyn AudioSink>,
        ));
        Self {
            cache,
            player,
            sink,
            dir,
        }
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.dir.path().join("scratch.wav")
    }
}
