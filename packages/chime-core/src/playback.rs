//! Playback serialization and acknowledgment timing.
//!
//! The audio primitive is fire-and-forget: it starts playing a file and
//! returns immediately, with no completion signal. [`Player`] therefore
//! converts the caller-declared duration into a synthetic wait before the
//! request is acknowledged, and a single process-wide lock guarantees that
//! at most one clip is ever being written to the scratch file or handed to
//! the output primitive at a time.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::protocol_constants::MIN_ACK_WAIT_MS;

/// Fire-and-forget audio output primitive.
///
/// Implementations start playback of the file at `path` and return without
/// waiting for completion. Errors mean playback could not be *started*;
/// nothing ever reports that it finished.
pub trait AudioSink: Send + Sync {
    /// Starts playing the file at `path`.
    fn play(&self, path: &Path) -> io::Result<()>;
}

/// Default sink: spawns an external player command with the file path
/// appended, e.g. `aplay -q /dev/shm/chime_play.wav`.
pub struct CommandSink {
    command: String,
}

impl CommandSink {
    /// Creates a sink around `command`, which may carry its own arguments
    /// (whitespace-separated).
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl AudioSink for CommandSink {
    fn play(&self, path: &Path) -> io::Result<()> {
        let mut parts = self.command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty player command",
            ));
        };

        let mut child = Command::new(program)
            .args(parts)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // Reap off-thread so starting playback never blocks the caller.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Enforces at-most-one-playback-in-flight across the whole process and
/// translates declared durations into acknowledgment delays.
pub struct Player {
    scratch_path: PathBuf,
    safety_margin_ms: u64,
    sink: Arc<dyn AudioSink>,
    lock: Mutex<()>,
}

impl Player {
    /// Creates a player writing clips to `scratch_path` before handing them
    /// to `sink`.
    pub fn new(
        scratch_path: impl Into<PathBuf>,
        safety_margin_ms: u64,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            scratch_path: scratch_path.into(),
            safety_margin_ms,
            sink,
            lock: Mutex::new(()),
        }
    }

    /// Acquires the process-wide playback lock for a sequence of plays.
    ///
    /// The lock is held until the returned session is dropped; batches use
    /// one session for all their clips so no other connection can interleave.
    pub async fn session(&self) -> PlaybackSession<'_> {
        PlaybackSession {
            player: self,
            _guard: self.lock.lock().await,
        }
    }

    /// One-shot play: lock, play a single clip, release.
    pub async fn play(&self, clip: &[u8], duration_ms: i32) -> io::Result<()> {
        self.session().await.play(clip, duration_ms).await
    }
}

/// Exclusive hold on the playback lock.
///
/// While a session is alive, no other connection can start a clip; the
/// scratch file has exactly one writer.
pub struct PlaybackSession<'a> {
    player: &'a Player,
    _guard: MutexGuard<'a, ()>,
}

impl PlaybackSession<'_> {
    /// Plays one clip and waits out its declared duration.
    ///
    /// Writes the clip to the scratch file (safe to overwrite - playback is
    /// serialized), starts the sink, then sleeps
    /// `max(MIN_ACK_WAIT_MS, duration_ms + safety_margin_ms)` before
    /// returning. The duration is caller-declared and trusted; the floor
    /// keeps a declared 0 from producing an instant false acknowledgment.
    pub async fn play(&self, clip: &[u8], duration_ms: i32) -> io::Result<()> {
        tokio::fs::write(&self.player.scratch_path, clip).await?;
        self.player.sink.play(&self.player.scratch_path)?;

        let wait_ms = (i64::from(duration_ms) + self.player.safety_margin_ms as i64)
            .max(MIN_ACK_WAIT_MS as i64) as u64;
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        Ok(())
    }
}
