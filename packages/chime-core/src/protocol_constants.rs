//! Fixed protocol constants that should NOT be changed.
//!
//! These values are part of the wire contract with deployed clients
//! (speech-pipeline tooling sends frames built around them); changing them
//! breaks compatibility.

// ─────────────────────────────────────────────────────────────────────────────
// Wire Framing
// ─────────────────────────────────────────────────────────────────────────────

/// Maximum length of the command line, in bytes, before the `\n` terminator.
///
/// A longer line is truncated silently at this ceiling and the remainder is
/// left in the stream; existing clients rely on this exact behavior.
pub const MAX_COMMAND_LINE_BYTES: usize = 256;

/// Maximum byte length of a single clip payload (~50 MB).
///
/// Large enough for several minutes of 48kHz stereo LPCM; anything bigger is
/// treated as resource exhaustion and rejected.
pub const MAX_CLIP_BYTES: i32 = 50_000_000;

/// Maximum declared clip duration (10 minutes, in milliseconds).
pub const MAX_DURATION_MS: i32 = 600_000;

/// Maximum number of clips in one `BATCH` request.
pub const MAX_BATCH_ITEMS: i32 = 200;

// ─────────────────────────────────────────────────────────────────────────────
// Acknowledgment Timing
// ─────────────────────────────────────────────────────────────────────────────

/// Floor on the acknowledgment wait (milliseconds).
///
/// A declared duration of 0 (or a client that lies) still yields a minimally
/// safe pause instead of an instant false acknowledgment.
pub const MIN_ACK_WAIT_MS: u64 = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Filesystem Layout
// ─────────────────────────────────────────────────────────────────────────────

/// Extension appended to every cache entry.
pub const CACHE_ENTRY_EXT: &str = "wav";
