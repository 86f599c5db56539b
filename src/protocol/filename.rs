//! Filename validation
//!
//! The server namespace is flat: a filename is a single path component that
//! fits in the header's fixed buffer with at least one NUL terminator left.

use std::fmt;

use thiserror::Error;

use super::FILENAME_SIZE;

/// Why a filename was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("filename is empty")]
    Empty,

    #[error("filename is too long ({len} bytes, limit is {} bytes)", FILENAME_SIZE - 1)]
    TooLong { len: usize },

    #[error("filename can't contain a slash")]
    Separator,

    #[error("filename can't contain a NUL byte")]
    Nul,

    #[error("filename can't be \".\" or \"..\"")]
    Reserved,

    #[error("filename is not valid UTF-8")]
    NotUtf8,
}

/// A validated filename
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filename(String);

impl Filename {
    /// Validate a user- or wire-supplied name
    pub fn parse(name: &str) -> Result<Self, FilenameError> {
        if name.is_empty() {
            return Err(FilenameError::Empty);
        }
        if name.len() >= FILENAME_SIZE {
            return Err(FilenameError::TooLong { len: name.len() });
        }
        if name.contains('/') {
            return Err(FilenameError::Separator);
        }
        if name.contains('\0') {
            return Err(FilenameError::Nul);
        }
        if name == "." || name == ".." {
            return Err(FilenameError::Reserved);
        }
        Ok(Self(name.to_string()))
    }

    /// Validate the NUL-padded filename field of a decoded header
    pub fn from_field(field: &[u8; FILENAME_SIZE]) -> Result<Self, FilenameError> {
        let len = field
            .iter()
            .position(|&b| b == 0)
            .ok_or(FilenameError::TooLong { len: FILENAME_SIZE })?;
        let name = std::str::from_utf8(&field[..len]).map_err(|_| FilenameError::NotUtf8)?;
        Self::parse(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for Filename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
