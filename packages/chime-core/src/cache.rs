//! On-disk clip cache keyed by client-supplied names.
//!
//! The cache is a flat directory of `.wav` files. Keys arrive over the wire
//! from untrusted clients, so every character outside a strict allow-list is
//! replaced before any path is built - this sanitization is the sole defense
//! against path traversal, not optional hardening.
//!
//! Writes are plain overwrite-in-place: concurrent `PUT`s to the same key
//! race at the filesystem level (last writer wins), which is acceptable for
//! a best-effort cache.

use std::io;
use std::path::{Path, PathBuf};

use crate::protocol_constants::CACHE_ENTRY_EXT;

/// Best-effort key→blob mapping backed by a flat directory.
pub struct ClipCache {
    root: PathBuf,
}

impl ClipCache {
    /// Creates a cache rooted at `root`. The directory itself is created
    /// lazily via [`ensure_dir`](Self::ensure_dir).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
    ///
    /// Distinct keys may collide after sanitization; colliding entries
    /// overwrite each other, which callers accept.
    #[must_use]
    pub fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Resolves the on-disk path for `key`, sanitizing it first.
    #[must_use]
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::sanitize_key(key), CACHE_ENTRY_EXT))
    }

    /// Idempotent create-if-absent of the cache root.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Writes or fully overwrites the entry for `key`.
    pub async fn put(&self, key: &str, clip: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.entry_path(key), clip).await
    }

    /// Returns whether an entry for `key` exists right now.
    ///
    /// The entry can disappear between this check and a subsequent
    /// [`get`](Self::get); callers treat that read failure as an I/O fault.
    pub async fn exists(&self, key: &str) -> bool {
        tokio::fs::metadata(self.entry_path(key)).await.is_ok()
    }

    /// Reads the full entry for `key`. Calling this for a key that was never
    /// stored is a caller error; the dispatcher checks `exists` first.
    pub async fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.entry_path(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Component;

    use tempfile::TempDir;

    fn cache_in_tempdir() -> (TempDir, ClipCache) {
        let dir = TempDir::new().expect("tempdir");
        let cache = ClipCache::new(dir.path().join("cache"));
        (dir, cache)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn sanitize_passes_allowed_characters_through() {
        assert_eq!(
            ClipCache::sanitize_key("page-03_chunk.7"),
            "page-03_chunk.7"
        );
    }

    #[test]
    fn sanitize_replaces_disallowed_characters() {
        assert_eq!(ClipCache::sanitize_key("a b/c\\d:e"), "a_b_c_d_e");
        assert_eq!(ClipCache::sanitize_key("こんにちは"), "_____");
    }

    #[test]
    fn traversal_key_resolves_inside_cache_root() {
        let (_dir, cache) = cache_in_tempdir();
        let path = cache.entry_path("../../etc/passwd");

        assert!(path.starts_with(cache.root()));
        assert!(path
            .components()
            .all(|c| !matches!(c, Component::ParentDir)));
    }

    #[test]
    fn absolute_key_resolves_inside_cache_root() {
        let (_dir, cache) = cache_in_tempdir();
        let path = cache.entry_path("/etc/shadow");
        assert!(path.starts_with(cache.root()));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Store Operations
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn put_then_get_roundtrips_exact_bytes() {
        let (_dir, cache) = cache_in_tempdir();
        cache.ensure_dir().await.unwrap();

        let clip = b"RIFF....WAVEfmt \x01\x02\x03";
        cache.put("greeting", clip).await.unwrap();

        assert!(cache.exists("greeting").await);
        assert_eq!(cache.get("greeting").await.unwrap(), clip);
    }

    #[tokio::test]
    async fn put_fully_overwrites_existing_entry() {
        let (_dir, cache) = cache_in_tempdir();
        cache.ensure_dir().await.unwrap();

        cache.put("k", b"a much longer first clip").await.unwrap();
        cache.put("k", b"short").await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn colliding_keys_share_one_entry() {
        let (_dir, cache) = cache_in_tempdir();
        cache.ensure_dir().await.unwrap();

        // "a b" and "a/b" both sanitize to "a_b"
        cache.put("a b", b"first").await.unwrap();
        cache.put("a/b", b"second").await.unwrap();

        assert_eq!(cache.get("a b").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn exists_is_false_for_missing_key() {
        let (_dir, cache) = cache_in_tempdir();
        cache.ensure_dir().await.unwrap();
        assert!(!cache.exists("never-stored").await);
    }

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let (_dir, cache) = cache_in_tempdir();
        cache.ensure_dir().await.unwrap();
        cache.ensure_dir().await.unwrap();
        assert!(cache.root().is_dir());
    }
}
