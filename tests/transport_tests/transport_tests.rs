//! Transport Tests
//!
//! Exact-transfer loops and the error categories they report.

use std::io::{self, Cursor, ErrorKind, Read, Write};
use std::thread;

use cix::transport::{
    accept, connect, discard_exact, is_resource_exhausted, listen, recv_exact, send_exact,
};
use cix::CixError;

// =============================================================================
// Helper Types
// =============================================================================

/// Reader that hands out one byte per call and fails with EINTR in between
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    interrupt_next: bool,
}

impl Trickle {
    fn new(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            pos: 0,
            interrupt_next: true,
        }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt_next {
            self.interrupt_next = false;
            return Err(io::Error::new(ErrorKind::Interrupted, "EINTR"));
        }
        self.interrupt_next = true;
        if self.pos == self.data.len() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.data[self.pos];
        self.pos += 1;
        Ok(1)
    }
}

/// Writer that takes at most `chunk` bytes per call, up to `capacity` in total
struct Narrow {
    written: Vec<u8>,
    chunk: usize,
    capacity: usize,
}

impl Write for Narrow {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.capacity - self.written.len();
        let n = buf.len().min(self.chunk).min(room);
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reader that always fails with a system error
struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::from_raw_os_error(104))
    }
}

// =============================================================================
// recv_exact Tests
// =============================================================================

#[test]
fn test_recv_exact_loops_over_short_and_interrupted_reads() {
    let mut reader = Trickle::new(b"hello world");
    let mut buf = [0u8; 11];
    recv_exact(&mut reader, &mut buf).unwrap();
    assert_eq!(&buf, b"hello world");
}

#[test]
fn test_recv_exact_clean_eof_is_peer_closed() {
    let mut reader = Cursor::new(Vec::new());
    let mut buf = [0u8; 4];
    assert!(matches!(
        recv_exact(&mut reader, &mut buf),
        Err(CixError::PeerClosed)
    ));
}

#[test]
fn test_recv_exact_mid_frame_eof_is_truncated() {
    let mut reader = Trickle::new(b"abc");
    let mut buf = [0u8; 8];
    assert!(matches!(
        recv_exact(&mut reader, &mut buf),
        Err(CixError::Truncated {
            expected: 8,
            received: 3
        })
    ));
}

#[test]
fn test_recv_exact_system_error_keeps_code() {
    let mut buf = [0u8; 4];
    match recv_exact(&mut Broken, &mut buf) {
        Err(CixError::Io(e)) => assert_eq!(e.raw_os_error(), Some(104)),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_recv_exact_empty_buffer_reads_nothing() {
    let mut reader = Cursor::new(b"left alone".to_vec());
    recv_exact(&mut reader, &mut []).unwrap();
    assert_eq!(reader.position(), 0);
}

// =============================================================================
// send_exact Tests
// =============================================================================

#[test]
fn test_send_exact_loops_over_short_writes() {
    let mut writer = Narrow {
        written: Vec::new(),
        chunk: 3,
        capacity: 1024,
    };
    send_exact(&mut writer, b"0123456789").unwrap();
    assert_eq!(writer.written, b"0123456789");
}

#[test]
fn test_send_exact_zero_write_fails() {
    let mut writer = Narrow {
        written: Vec::new(),
        chunk: 4,
        capacity: 6,
    };
    match send_exact(&mut writer, b"0123456789") {
        Err(CixError::Io(e)) => assert_eq!(e.kind(), ErrorKind::WriteZero),
        other => panic!("expected WriteZero, got {:?}", other),
    }
    assert_eq!(writer.written, b"012345");
}

// =============================================================================
// discard_exact Tests
// =============================================================================

#[test]
fn test_discard_exact_consumes_exactly() {
    let mut data = vec![0u8; 20_000];
    data.extend_from_slice(b"tail");
    let mut reader = Cursor::new(data);

    discard_exact(&mut reader, 20_000).unwrap();

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"tail");
}

#[test]
fn test_discard_exact_reports_progress_on_truncation() {
    let mut reader = Cursor::new(vec![0u8; 10_000]);
    assert!(matches!(
        discard_exact(&mut reader, 12_000),
        Err(CixError::Truncated {
            expected: 12_000,
            received: 10_000
        })
    ));
}

#[test]
fn test_discard_exact_on_empty_stream_is_peer_closed() {
    let mut reader = Cursor::new(Vec::new());
    assert!(matches!(
        discard_exact(&mut reader, 5),
        Err(CixError::PeerClosed)
    ));
}

// =============================================================================
// Socket Tests
// =============================================================================

#[test]
fn test_listen_accept_connect_roundtrip() {
    let listener = listen("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let client = thread::spawn(move || {
        let mut stream = connect(&addr.to_string()).unwrap();
        send_exact(&mut stream, b"ping").unwrap();
        let mut reply = [0u8; 4];
        recv_exact(&mut stream, &mut reply).unwrap();
        reply
    });

    let (mut stream, _peer) = accept(&listener).unwrap();
    let mut request = [0u8; 4];
    recv_exact(&mut stream, &mut request).unwrap();
    assert_eq!(&request, b"ping");
    send_exact(&mut stream, b"pong").unwrap();

    assert_eq!(&client.join().unwrap(), b"pong");
}

#[test]
fn test_peer_close_is_seen_as_peer_closed() {
    let listener = listen("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let client = thread::spawn(move || {
        let stream = connect(&addr.to_string()).unwrap();
        drop(stream);
    });

    let (mut stream, _peer) = accept(&listener).unwrap();
    client.join().unwrap();

    let mut buf = [0u8; 16];
    assert!(matches!(
        recv_exact(&mut stream, &mut buf),
        Err(CixError::PeerClosed)
    ));
}

#[test]
fn test_listen_on_used_port_is_bind_error() {
    let listener = listen("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    match listen(&addr) {
        Err(CixError::Bind { addr: reported, .. }) => assert_eq!(reported, addr),
        other => panic!("expected Bind error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_connect_refused_is_connect_error() {
    let addr = {
        let listener = listen("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    assert!(matches!(
        connect(&addr),
        Err(CixError::Connect { .. })
    ));
}

// =============================================================================
// Accept Error Classification
// =============================================================================

#[cfg(unix)]
#[test]
fn test_descriptor_and_memory_shortages_are_retryable() {
    // ENOMEM, ENFILE, EMFILE
    for code in [12, 23, 24] {
        let err = io::Error::from_raw_os_error(code);
        assert!(is_resource_exhausted(&err), "errno {}", code);
    }
    assert!(is_resource_exhausted(&io::Error::from(ErrorKind::OutOfMemory)));
}

#[test]
fn test_other_accept_failures_are_not_retryable() {
    for kind in [
        ErrorKind::InvalidInput,
        ErrorKind::PermissionDenied,
        ErrorKind::ConnectionAborted,
    ] {
        assert!(!is_resource_exhausted(&io::Error::from(kind)), "{:?}", kind);
    }
}
