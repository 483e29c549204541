//! Centralized error types for the Chime core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps the protocol error taxonomy onto single-line wire replies
//! - Provides machine-readable error codes for logging

use thiserror::Error;

use crate::server::Reply;

/// Application-wide error type for the Chime server.
#[derive(Debug, Error)]
pub enum ChimeError {
    /// Malformed command line: unknown command or missing argument.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Out-of-range payload length, duration, or batch count.
    #[error("invalid request: {0}")]
    Validation(String),

    /// `PLAYKEY` addressed a cache entry that does not exist.
    #[error("no cached clip for key: {0}")]
    NotFound(String),

    /// Filesystem or socket failure; terminal for the connection.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChimeError {
    /// Returns a machine-readable error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "protocol_error",
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Io(_) => "io_fault",
        }
    }

    /// Maps the error to the wire reply the client should receive, if any.
    ///
    /// I/O faults have no reply: the connection is closed instead, and the
    /// client treats connection-reset-without-response as a failure.
    pub fn reply(&self) -> Option<Reply> {
        match self {
            Self::Protocol(_) | Self::Validation(_) => Some(Reply::Err),
            Self::NotFound(_) => Some(Reply::NoFile),
            Self::Io(_) => None,
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type ChimeResult<T> = Result<T, ChimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_replies_err() {
        let err = ChimeError::Validation("clip length -1 out of range".into());
        assert_eq!(err.code(), "validation_error");
        assert_eq!(err.reply(), Some(Reply::Err));
    }

    #[test]
    fn not_found_replies_nofile() {
        let err = ChimeError::NotFound("greeting".into());
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.reply(), Some(Reply::NoFile));
    }

    #[test]
    fn io_fault_has_no_reply() {
        let err = ChimeError::from(std::io::Error::other("disk on fire"));
        assert_eq!(err.code(), "io_fault");
        assert_eq!(err.reply(), None);
    }
}
