//! Chime Core - shared library for the Chime playback acknowledgment server.
//!
//! Chime lets a speech-synthesis pipeline fire-and-forget audio at a machine
//! with a sound device: clients submit pre-rendered waveform clips over a
//! persistent TCP connection, the server plays them through the local audio
//! output, and acknowledges only after playback has plausibly completed.
//! Acknowledgment timing is synthetic - the caller declares a duration and the
//! server pads it with a safety margin, because the underlying audio primitive
//! offers no completion signal.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`server`]: TCP accept loop, command framing and dispatch
//! - [`cache`]: on-disk clip cache keyed by sanitized client keys
//! - [`playback`]: process-wide playback serialization and acknowledgment timing
//! - [`state`]: runtime configuration
//! - [`error`]: centralized error types
//! - [`protocol_constants`]: wire limits fixed by deployed clients
//!
//! The audio output device is abstracted behind the
//! [`AudioSink`](playback::AudioSink) trait so the protocol machinery can be
//! tested without a sound card; the default [`CommandSink`](playback::CommandSink)
//! spawns an external player command.

#![warn(clippy::all)]

pub mod cache;
pub mod error;
pub mod playback;
pub mod protocol_constants;
pub mod server;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at the crate root
pub use cache::ClipCache;
pub use error::{ChimeError, ChimeResult};
pub use playback::{AudioSink, CommandSink, PlaybackSession, Player};
pub use server::{run, Reply};
pub use state::Config;
