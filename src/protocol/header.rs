//! Header definitions
//!
//! The fixed-size frame that opens every request and every reply.

use std::fmt;

use super::{Command, Filename, FilenameError, FILENAME_SIZE};

/// Fixed-layout message header
#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    /// What this message is
    pub command: Command,

    /// Length of the payload that follows.
    /// In a NAK this slot carries the OS error code instead and no payload follows.
    pub byte_count: u32,

    /// NUL-padded filename field
    filename: [u8; FILENAME_SIZE],
}

impl Header {
    /// A header with no filename and no payload
    pub fn new(command: Command) -> Self {
        Self {
            command,
            byte_count: 0,
            filename: [0u8; FILENAME_SIZE],
        }
    }

    /// A request header naming `filename`
    pub fn request(command: Command, filename: &Filename) -> Self {
        let mut header = Self::new(command);
        // Filename::parse guarantees len < FILENAME_SIZE, so a NUL always remains
        header.filename[..filename.len()].copy_from_slice(filename.as_str().as_bytes());
        header
    }

    /// Rebuild a header from already-decoded wire fields
    pub fn from_parts(command: Command, byte_count: u32, filename: [u8; FILENAME_SIZE]) -> Self {
        Self {
            command,
            byte_count,
            filename,
        }
    }

    pub fn with_byte_count(mut self, byte_count: u32) -> Self {
        self.byte_count = byte_count;
        self
    }

    pub fn ack() -> Self {
        Self::new(Command::Ack)
    }

    /// A NAK carrying an OS error code
    pub fn nak(code: u32) -> Self {
        Self::new(Command::Nak).with_byte_count(code)
    }

    pub fn list_result(len: u32) -> Self {
        Self::new(Command::ListResult).with_byte_count(len)
    }

    pub fn file_result(len: u32) -> Self {
        Self::new(Command::FileResult).with_byte_count(len)
    }

    /// The raw filename field as sent on the wire
    pub fn filename_field(&self) -> &[u8; FILENAME_SIZE] {
        &self.filename
    }

    /// Validate and return the filename field
    pub fn filename(&self) -> Result<Filename, FilenameError> {
        Filename::from_field(&self.filename)
    }

    /// Filename for log output, lossy and never failing
    pub fn display_filename(&self) -> String {
        let end = self
            .filename
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILENAME_SIZE);
        String::from_utf8_lossy(&self.filename[..end]).into_owned()
    }

    /// Whether a payload of `byte_count` bytes follows this header on the wire
    pub fn carries_payload(&self) -> bool {
        matches!(
            self.command,
            Command::Store | Command::FileResult | Command::ListResult
        ) && self.byte_count > 0
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{} byte_count={} filename={:?}}}",
            self.command,
            self.byte_count,
            self.display_filename()
        )
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("command", &self.command)
            .field("byte_count", &self.byte_count)
            .field("filename", &self.display_filename())
            .finish()
    }
}
