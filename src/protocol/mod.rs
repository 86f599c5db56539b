//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Exchange Shape
//!
//! Every exchange is one request followed by one reply. Both are a 64-byte
//! header, optionally followed by exactly `byte_count` payload bytes:
//!
//! ```text
//! client                                server
//!   │── LIST ──────────────────────────────▶│
//!   │◀──────────── LIST-RESULT + listing ───│
//!   │── FETCH name ────────────────────────▶│
//!   │◀────────── FILE-RESULT + contents ────│   or NAK(errno)
//!   │── STORE name + contents ─────────────▶│
//!   │◀──────────────────────────── ACK ─────│   or NAK(errno)
//!   │── DELETE name ───────────────────────▶│
//!   │◀──────────────────────────── ACK ─────│   or NAK(errno)
//! ```
//!
//! ### Command Codes
//! - 0: ERROR (sentinel)   - 1: EXIT    - 2: FETCH       - 3: HELP
//! - 4: LIST               - 5: STORE   - 6: DELETE      - 7: FILE-RESULT
//! - 8: LIST-RESULT        - 9: ACK     - 10: NAK

mod codec;
mod command;
mod filename;
mod header;

pub use codec::{
    decode_header, encode_header, read_header, read_payload, write_message, HEADER_SIZE,
};
pub use command::Command;
pub use filename::{Filename, FilenameError};
pub use header::Header;

/// Capacity of the header's filename field, terminator included
pub const FILENAME_SIZE: usize = 59;

/// Default cap on a single payload (64 MB)
pub const DEFAULT_MAX_PAYLOAD: u32 = 64 * 1024 * 1024;

/// OS error codes placed in a NAK's byte_count when no real one is available
pub mod errno {
    /// I/O error
    pub const EIO: u32 = 5;
    /// Invalid argument (bad filename, not a request)
    pub const EINVAL: u32 = 22;
    /// File too large
    pub const EFBIG: u32 = 27;
}
