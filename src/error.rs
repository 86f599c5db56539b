//! Error types for cix
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::protocol::{Command, FilenameError};

/// Result type alias using CixError
pub type Result<T> = std::result::Result<T, CixError>;

/// Unified error type for cix operations
#[derive(Debug, Error)]
pub enum CixError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Peer closed the stream before sending any byte of the next frame
    #[error("peer closed the connection")]
    PeerClosed,

    /// Peer closed the stream partway through a frame
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    Truncated { expected: usize, received: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("invalid filename: {0}")]
    InvalidFilename(#[from] FilenameError),

    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: u64, max: u32 },

    /// The server answered NAK; `code` is the OS error number it reported
    #[error("server refused {command}: {}", std::io::Error::from_raw_os_error(*code as i32))]
    Nak { command: Command, code: u32 },

    // -------------------------------------------------------------------------
    // Local File Errors
    // -------------------------------------------------------------------------
    #[error("{}: {source}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CixError {
    /// Whether the session can carry on after this error.
    ///
    /// Validation failures, NAK replies and local file problems are reported
    /// to the user and the session continues. Everything else leaves the
    /// stream in an unknown state and ends the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CixError::InvalidFilename(_)
                | CixError::PayloadTooLarge { .. }
                | CixError::Nak { .. }
                | CixError::LocalFile { .. }
        )
    }
}
