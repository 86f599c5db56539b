//! Session Handler
//!
//! Serves one client connection: reads a header, performs the request
//! against the file store, replies, and waits for the next header.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CixError, Result};
use crate::protocol::{errno, read_header, read_payload, write_message, Command, Header};
use crate::storage::{nak_code, FileStore};

/// Handles a single client connection
pub struct Session {
    /// Session id, shared with the worker that runs it
    id: u64,

    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Files served to this client
    store: Arc<FileStore>,

    /// Largest STORE payload accepted
    max_payload: u32,

    /// Peer address for logging
    peer_addr: String,
}

impl Session {
    /// Create a new session handler
    pub fn new(id: u64, stream: TcpStream, store: Arc<FileStore>, max_payload: u32) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            id,
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            max_payload,
            peer_addr,
        })
    }

    /// Configure session timeouts (0 leaves the stream blocking forever)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Serve requests until the client goes away (blocking)
    ///
    /// Returns `Ok` when the peer closes the stream between requests and
    /// `Err` for anything that breaks framing: a truncated frame, a failed
    /// write, or a system error.
    pub fn handle(&mut self) -> Result<()> {
        let span = tracing::info_span!("session", id = self.id, peer = %self.peer_addr);
        let _enter = span.enter();
        tracing::info!("session started");

        loop {
            let header = match read_header(&mut self.reader) {
                Ok(header) => header,
                Err(CixError::PeerClosed) => {
                    tracing::info!("client disconnected");
                    return Ok(());
                }
                Err(e) if is_disconnect(&e) => {
                    tracing::info!("connection dropped by client: {}", e);
                    return Ok(());
                }
                Err(CixError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::info!("read timeout, closing session");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("error reading header: {}", e);
                    return Err(e);
                }
            };

            tracing::debug!("received header {}", header);

            if let Err(e) = self.dispatch(&header) {
                if is_disconnect(&e) {
                    tracing::info!("client went away during {}: {}", header.command, e);
                    return Ok(());
                }
                tracing::warn!("session failed during {}: {}", header.command, e);
                return Err(e);
            }
        }
    }

    /// Perform one request and send its reply
    fn dispatch(&mut self, header: &Header) -> Result<()> {
        match header.command {
            Command::List => self.reply_list(),
            Command::Fetch => self.reply_fetch(header),
            Command::Store => self.reply_store(header),
            Command::Delete => self.reply_delete(header),
            _ => {
                tracing::warn!("invalid client header {}", header);
                self.send(&Header::nak(errno::EINVAL), &[])
            }
        }
    }

    fn reply_list(&mut self) -> Result<()> {
        let listing = match self.store.list() {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("listing {} failed: {}", self.store.root().display(), e);
                return self.send(&Header::nak(nak_code(&e)), &[]);
            }
        };
        let Ok(len) = u32::try_from(listing.len()) else {
            return self.send(&Header::nak(errno::EFBIG), &[]);
        };
        self.send(&Header::list_result(len), &listing)
    }

    fn reply_fetch(&mut self, header: &Header) -> Result<()> {
        let name = match header.filename() {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("FETCH rejected: {}", e);
                return self.send(&Header::nak(errno::EINVAL), &[]);
            }
        };

        let contents = match self.store.read(&name) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::info!("{}: {}", name, e);
                return self.send(&Header::nak(nak_code(&e)), &[]);
            }
        };
        let Ok(len) = u32::try_from(contents.len()) else {
            tracing::warn!("{}: {} bytes does not fit in a reply", name, contents.len());
            return self.send(&Header::nak(errno::EFBIG), &[]);
        };
        self.send(&Header::file_result(len), &contents)
    }

    fn reply_store(&mut self, header: &Header) -> Result<()> {
        // The announced payload is always consumed, whatever the outcome,
        // so the next header starts on a frame boundary.
        let payload = match read_payload(&mut self.reader, header.byte_count, self.max_payload) {
            Ok(payload) => payload,
            Err(e @ CixError::PayloadTooLarge { .. }) => {
                tracing::warn!("STORE rejected: {}", e);
                return self.send(&Header::nak(errno::EFBIG), &[]);
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("received {} bytes", payload.len());

        let name = match header.filename() {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("STORE rejected: {}", e);
                return self.send(&Header::nak(errno::EINVAL), &[]);
            }
        };

        match self.store.write(&name, &payload) {
            Ok(()) => {
                tracing::info!("stored {} ({} bytes)", name, payload.len());
                self.send(&Header::ack(), &[])
            }
            Err(e) => {
                tracing::warn!("{}: {}", name, e);
                self.send(&Header::nak(nak_code(&e)), &[])
            }
        }
    }

    fn reply_delete(&mut self, header: &Header) -> Result<()> {
        let name = match header.filename() {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("DELETE rejected: {}", e);
                return self.send(&Header::nak(errno::EINVAL), &[]);
            }
        };

        match self.store.remove(&name) {
            Ok(()) => {
                tracing::info!("removed {}", name);
                self.send(&Header::ack(), &[])
            }
            Err(e) => {
                tracing::info!("{}: {}", name, e);
                self.send(&Header::nak(nak_code(&e)), &[])
            }
        }
    }

    /// Send a reply to the client
    fn send(&mut self, header: &Header, payload: &[u8]) -> Result<()> {
        tracing::debug!("sending header {}", header);
        write_message(&mut self.writer, header, payload)?;
        if !payload.is_empty() {
            tracing::debug!("sent {} bytes", payload.len());
        }
        Ok(())
    }
}

/// The peer vanished; not a server-side failure
fn is_disconnect(err: &CixError) -> bool {
    match err {
        CixError::Io(e) => matches!(
            e.kind(),
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
        ),
        _ => false,
    }
}
