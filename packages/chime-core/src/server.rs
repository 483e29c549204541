//! TCP protocol server: command framing, dispatch, and replies.
//!
//! Each connection carries exactly one request/response cycle: an ASCII
//! command line, command-specific big-endian integer fields and raw payload
//! bytes, then a single status line back. The handler writes at most one
//! reply and the socket is closed under all outcomes; an I/O fault closes it
//! with no reply at all, which clients treat as a failure.
//!
//! Framing is payload-length-driven after the first line - there is no end
//! marker, so a client that declares more bytes than it sends parks its own
//! connection task on the read until it disconnects. No read deadline is
//! imposed; deployed clients set their own socket timeouts.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::cache::ClipCache;
use crate::error::{ChimeError, ChimeResult};
use crate::playback::Player;
use crate::protocol_constants::{
    MAX_BATCH_ITEMS, MAX_CLIP_BYTES, MAX_COMMAND_LINE_BYTES, MAX_DURATION_MS,
};
use crate::state::Config;

/// Single-line wire replies. Exactly one is written per served request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Clip cached (`PUT`).
    Ok,
    /// Playback completed, plausibly (`PLAY`, `PLAYKEY`, `BATCH`).
    Ack,
    /// Protocol or validation failure.
    Err,
    /// `PLAYKEY` for a key with no cache entry.
    NoFile,
}

impl Reply {
    /// The terminated wire form of the reply.
    #[must_use]
    pub fn as_line(self) -> &'static [u8] {
        match self {
            Self::Ok => b"OK\n",
            Self::Ack => b"ACK\n",
            Self::Err => b"ERR\n",
            Self::NoFile => b"NOFILE\n",
        }
    }
}

/// Binds the listener and serves connections until the task is aborted.
///
/// One tokio task is spawned per accepted connection, unbounded - expected
/// load is a handful of long-lived control-plane clients, not public
/// traffic. `TCP_NODELAY` is enabled on every socket since replies are
/// short and latency-sensitive.
pub async fn run(
    config: &Config,
    cache: Arc<ClipCache>,
    player: Arc<Player>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.bind_port)).await?;
    log::info!("[Server] listening on port {}", config.bind_port);

    loop {
        let (socket, peer) = listener.accept().await?;
        if let Err(e) = socket.set_nodelay(true) {
            log::warn!("[Server] failed to set TCP_NODELAY for {}: {}", peer, e);
        }

        let cache = Arc::clone(&cache);
        let player = Arc::clone(&player);
        tokio::spawn(async move {
            let (reader, writer) = socket.into_split();
            match handle_connection(reader, writer, &cache, &player).await {
                Ok(()) => log::debug!("[Server] {} served", peer),
                Err(e) => log::warn!("[Server] {} aborted: {} ({})", peer, e, e.code()),
            }
        });
    }
}

/// Serves one request/response cycle over any byte stream.
///
/// Generic over the stream halves so protocol tests can drive it through an
/// in-memory duplex pipe. Writes at most one reply line; `Err` is returned
/// only for I/O faults, after which the caller drops the stream.
pub(crate) async fn handle_connection<R, W>(
    reader: R,
    mut writer: W,
    cache: &ClipCache,
    player: &Player,
) -> ChimeResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);

    // Half-open connection (or a bare newline): close without replying.
    let Some(line) = read_command_line(&mut reader).await? else {
        return Ok(());
    };

    let reply = match dispatch(&line, &mut reader, cache, player).await {
        Ok(reply) => reply,
        Err(err) => match err.reply() {
            Some(reply) => {
                log::debug!("[Server] rejected request: {} ({})", err, err.code());
                reply
            }
            None => return Err(err),
        },
    };

    writer.write_all(reply.as_line()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one ASCII command line, one byte at a time.
///
/// Stops at `\n` (not stored); every `\r` is dropped, though it still counts
/// toward the ceiling of [`MAX_COMMAND_LINE_BYTES`]. A line exceeding the
/// ceiling is truncated silently with the remainder left in the stream -
/// deployed clients rely on this exact behavior. Returns `None` when nothing
/// was accumulated.
async fn read_command_line<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    for _ in 0..MAX_COMMAND_LINE_BYTES {
        if reader.read(&mut byte).await? == 0 {
            break; // EOF
        }
        match byte[0] {
            b'\n' => break,
            b'\r' => {}
            b => line.push(b),
        }
    }

    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

/// Splits the command line and routes to the matching handler.
async fn dispatch<R>(
    line: &str,
    reader: &mut R,
    cache: &ClipCache,
    player: &Player,
) -> ChimeResult<Reply>
where
    R: AsyncRead + Unpin,
{
    let mut tokens = line.split_whitespace();
    let command = tokens.next().unwrap_or("");

    match command {
        "PUT" => handle_put(tokens.next(), reader, cache).await,
        "PLAYKEY" => handle_playkey(tokens.next(), reader, cache, player).await,
        "PLAY" => handle_play(reader, player).await,
        "BATCH" => handle_batch(reader, player).await,
        other => Err(ChimeError::Protocol(format!("unknown command {:?}", other))),
    }
}

/// Enforces the wire limits on one clip header.
fn validate_clip(duration_ms: i32, len: i32) -> ChimeResult<()> {
    if len <= 0 || len > MAX_CLIP_BYTES {
        return Err(ChimeError::Validation(format!(
            "clip length {} outside 1..={}",
            len, MAX_CLIP_BYTES
        )));
    }
    if duration_ms < 0 || duration_ms > MAX_DURATION_MS {
        return Err(ChimeError::Validation(format!(
            "duration {}ms outside 0..={}",
            duration_ms, MAX_DURATION_MS
        )));
    }
    Ok(())
}

/// Reads a declared number of payload bytes in full.
async fn read_clip<R>(reader: &mut R, len: i32) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut clip = vec![0u8; len as usize];
    reader.read_exact(&mut clip).await?;
    Ok(clip)
}

/// `PUT key` + duration_ms + n + n bytes: cache the clip, never play it.
///
/// Cache-only, so it never touches the playback lock and stays fully
/// concurrent with audio in progress on other connections.
async fn handle_put<R>(key: Option<&str>, reader: &mut R, cache: &ClipCache) -> ChimeResult<Reply>
where
    R: AsyncRead + Unpin,
{
    let key = key.ok_or_else(|| ChimeError::Protocol("PUT requires a key".into()))?;
    cache.ensure_dir().await?;

    let duration_ms = reader.read_i32().await?;
    let len = reader.read_i32().await?;
    validate_clip(duration_ms, len)?;

    let clip = read_clip(reader, len).await?;
    cache.put(key, &clip).await?;

    log::debug!("[Cache] stored {} bytes under key {:?}", clip.len(), key);
    Ok(Reply::Ok)
}

/// `PLAYKEY key` + duration_ms: play a previously cached clip.
///
/// The duration is not range-checked here (matching the wire contract);
/// the acknowledgment floor absorbs nonsense values.
async fn handle_playkey<R>(
    key: Option<&str>,
    reader: &mut R,
    cache: &ClipCache,
    player: &Player,
) -> ChimeResult<Reply>
where
    R: AsyncRead + Unpin,
{
    let key = key.ok_or_else(|| ChimeError::Protocol("PLAYKEY requires a key".into()))?;
    let duration_ms = reader.read_i32().await?;

    // Checked before the lock so a missing key answers NOFILE immediately,
    // even while another connection's clip is playing.
    if !cache.exists(key).await {
        return Err(ChimeError::NotFound(key.to_string()));
    }

    // The entry can vanish between the check and this read; the resulting
    // I/O fault closes the connection with no reply.
    let clip = cache.get(key).await?;

    player.play(&clip, duration_ms).await?;
    Ok(Reply::Ack)
}

/// `PLAY` + duration_ms + n + n bytes: play the clip without persisting it.
async fn handle_play<R>(reader: &mut R, player: &Player) -> ChimeResult<Reply>
where
    R: AsyncRead + Unpin,
{
    let duration_ms = reader.read_i32().await?;
    let len = reader.read_i32().await?;
    validate_clip(duration_ms, len)?;

    let clip = read_clip(reader, len).await?;

    player.play(&clip, duration_ms).await?;
    Ok(Reply::Ack)
}

/// `BATCH` + count, then per item duration_ms + n + n bytes: gapless
/// sequential playback under one lock acquisition, one `ACK` at the end.
///
/// The first invalid item aborts the batch with `ERR`, leaving any declared
/// payload unread; the stream state past that point is unspecified, which is
/// fine because the connection closes afterward. Earlier items have already
/// played - `BATCH` is not atomic.
async fn handle_batch<R>(reader: &mut R, player: &Player) -> ChimeResult<Reply>
where
    R: AsyncRead + Unpin,
{
    let count = reader.read_i32().await?;
    if count <= 0 || count > MAX_BATCH_ITEMS {
        return Err(ChimeError::Validation(format!(
            "batch count {} outside 1..={}",
            count, MAX_BATCH_ITEMS
        )));
    }

    let session = player.session().await;
    for _ in 0..count {
        let duration_ms = reader.read_i32().await?;
        let len = reader.read_i32().await?;
        validate_clip(duration_ms, len)?;

        let clip = read_clip(reader, len).await?;
        session.play(&clip, duration_ms).await?;
    }
    Ok(Reply::Ack)
}
