//! Storage Module
//!
//! The server's flat file namespace.
//!
//! ## Responsibilities
//! - Resolve validated filenames inside the storage root
//! - Produce the directory listing sent for LIST
//! - Read, write and remove whole files
//!
//! Failures are plain `std::io::Error`s; the session turns them into NAK
//! replies with `nak_code`.

mod store;

pub use store::FileStore;

use crate::protocol::errno;

/// The diagnostic code sent in a NAK for a filesystem failure
pub fn nak_code(err: &std::io::Error) -> u32 {
    err.raw_os_error()
        .and_then(|code| u32::try_from(code).ok())
        .unwrap_or(errno::EIO)
}
