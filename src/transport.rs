//! Transport Adapter
//!
//! Thin wrapper over TCP byte streams. A single read or write call may move
//! fewer bytes than asked for, so the exact-transfer helpers loop until the
//! whole frame has moved or the stream fails.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use crate::error::{CixError, Result};

/// Chunk size used when draining unwanted payload bytes
const DISCARD_CHUNK: usize = 8 * 1024;

const ENOMEM: i32 = 12;
const ENFILE: i32 = 23;
const EMFILE: i32 = 24;
#[cfg(target_os = "linux")]
const ENOBUFS: i32 = 105;
#[cfg(not(target_os = "linux"))]
const ENOBUFS: i32 = 55;

/// Connect to a server
pub fn connect(addr: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr).map_err(|source| CixError::Connect {
        addr: addr.to_string(),
        source,
    })?;
    // Headers are small and every exchange waits for a reply
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Bind a listening socket
pub fn listen(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).map_err(|source| CixError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Accept one connection, retrying interrupted calls
pub fn accept(listener: &TcpListener) -> Result<(TcpStream, SocketAddr)> {
    loop {
        match listener.accept() {
            Ok(accepted) => return Ok(accepted),
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                tracing::debug!("accept interrupted, retrying");
                continue;
            }
            Err(e) => return Err(CixError::Io(e)),
        }
    }
}

/// Whether an accept failure comes from the process or system running out
/// of descriptors, buffers or memory. These clear once sessions end, so the
/// listener should back off and try again.
pub fn is_resource_exhausted(e: &io::Error) -> bool {
    e.kind() == ErrorKind::OutOfMemory
        || matches!(e.raw_os_error(), Some(ENOMEM | ENFILE | EMFILE | ENOBUFS))
}

/// Write all of `bytes`
pub fn send_exact<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let mut sent = 0;
    while sent < bytes.len() {
        match writer.write(&bytes[sent..]) {
            Ok(0) => {
                return Err(CixError::Io(io::Error::new(
                    ErrorKind::WriteZero,
                    format!("stream accepted no bytes after {} of {}", sent, bytes.len()),
                )))
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CixError::Io(e)),
        }
    }
    Ok(())
}

/// Fill `buf` completely
///
/// - EOF before any byte: `PeerClosed` (normal end of a session)
/// - EOF after some bytes: `Truncated`
/// - anything else: `Io` with the underlying error
pub fn recv_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut received = 0;
    while received < buf.len() {
        match reader.read(&mut buf[received..]) {
            Ok(0) if received == 0 => return Err(CixError::PeerClosed),
            Ok(0) => {
                return Err(CixError::Truncated {
                    expected: buf.len(),
                    received,
                })
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CixError::Io(e)),
        }
    }
    Ok(())
}

/// Read and drop exactly `len` bytes, with the same error categories as `recv_exact`
pub fn discard_exact<R: Read>(reader: &mut R, len: u64) -> Result<()> {
    let mut chunk = [0u8; DISCARD_CHUNK];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(DISCARD_CHUNK as u64) as usize;
        match recv_exact(reader, &mut chunk[..want]) {
            Ok(()) => remaining -= want as u64,
            Err(CixError::PeerClosed) if remaining == len => return Err(CixError::PeerClosed),
            Err(CixError::PeerClosed) => {
                return Err(CixError::Truncated {
                    expected: len as usize,
                    received: (len - remaining) as usize,
                })
            }
            Err(CixError::Truncated { received, .. }) => {
                return Err(CixError::Truncated {
                    expected: len as usize,
                    received: (len - remaining) as usize + received,
                })
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
