//! Protocol codec
//!
//! Encoding and decoding of headers, and whole-message stream I/O.
//!
//! ## Wire Format
//!
//! ```text
//! ┌────────────────┬─────────┬──────────────────────────────┐
//! │ byte_count (4) │ cmd (1) │ filename (59, NUL-padded)    │  header, 64 bytes
//! └────────────────┴─────────┴──────────────────────────────┘
//! ┌──────────────────────────────────────────────────────────┐
//! │ payload (byte_count bytes, STORE / *-RESULT only)        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `byte_count` is in host byte order; both peers are assumed to share it.

use std::io::{Read, Write};

use bytes::{Buf, BufMut};

use crate::error::{CixError, Result};
use crate::transport::{discard_exact, recv_exact, send_exact};

use super::{Command, Header, FILENAME_SIZE};

/// Header size: 4 bytes byte_count + 1 byte command + filename field
pub const HEADER_SIZE: usize = 4 + 1 + FILENAME_SIZE;

// =============================================================================
// Header Encoding/Decoding
// =============================================================================

/// Encode a header to its fixed wire form
pub fn encode_header(header: &Header) -> [u8; HEADER_SIZE] {
    let mut bytes = [0u8; HEADER_SIZE];
    let mut buf = &mut bytes[..];
    buf.put_u32_ne(header.byte_count);
    buf.put_u8(header.command.code());
    buf.put_slice(header.filename_field());
    bytes
}

/// Decode a header from at least `HEADER_SIZE` bytes
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(CixError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut buf = &bytes[..HEADER_SIZE];
    let byte_count = buf.get_u32_ne();
    let command = Command::from_code(buf.get_u8());
    let mut filename = [0u8; FILENAME_SIZE];
    buf.copy_to_slice(&mut filename);

    Ok(Header::from_parts(command, byte_count, filename))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one header from a stream
///
/// A clean close before the first byte surfaces as `PeerClosed`.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Header> {
    let mut bytes = [0u8; HEADER_SIZE];
    recv_exact(reader, &mut bytes)?;
    decode_header(&bytes)
}

/// Read the payload announced by a header
///
/// Payloads over `max` are drained from the stream so framing stays aligned,
/// then reported as `PayloadTooLarge`.
pub fn read_payload<R: Read>(reader: &mut R, len: u32, max: u32) -> Result<Vec<u8>> {
    if len > max {
        discard_exact(reader, u64::from(len)).map_err(|e| mid_frame(e, len as usize))?;
        return Err(CixError::PayloadTooLarge {
            size: u64::from(len),
            max,
        });
    }

    let mut payload = vec![0u8; len as usize];
    recv_exact(reader, &mut payload).map_err(|e| mid_frame(e, len as usize))?;
    Ok(payload)
}

/// Write a header followed by its payload, then flush
pub fn write_message<W: Write>(writer: &mut W, header: &Header, payload: &[u8]) -> Result<()> {
    let announced = if header.carries_payload() {
        header.byte_count as usize
    } else {
        0
    };
    if announced != payload.len() {
        return Err(CixError::Protocol(format!(
            "{} announces {} payload bytes but {} were supplied",
            header.command,
            announced,
            payload.len()
        )));
    }

    send_exact(writer, &encode_header(header))?;
    if !payload.is_empty() {
        send_exact(writer, payload)?;
    }
    writer.flush()?;
    Ok(())
}

/// A close right after the header is still a truncated message
fn mid_frame(err: CixError, expected: usize) -> CixError {
    match err {
        CixError::PeerClosed => CixError::Truncated {
            expected,
            received: 0,
        },
        other => other,
    }
}
