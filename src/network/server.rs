//! TCP Server
//!
//! Accepts connections and hands each one to its own worker thread.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{CixError, Result};
use crate::storage::FileStore;
use crate::transport;

use super::{Session, WorkerSet};

/// Pause before retrying an accept that failed for lack of resources
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP server for cix
pub struct Server {
    config: Config,

    /// Owned by the accept loop only; workers get their accepted stream and nothing else
    listener: TcpListener,

    local_addr: SocketAddr,

    store: Arc<FileStore>,

    workers: Arc<WorkerSet>,

    shutdown: Arc<AtomicBool>,
}

/// Cloneable control handle for a running server
#[derive(Clone)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    workers: Arc<WorkerSet>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Open the storage root and bind the listening socket
    pub fn bind(config: Config) -> Result<Self> {
        let store = FileStore::open(&config.root_dir)?;
        let listener = transport::listen(&config.listen_addr)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config,
            listener,
            local_addr,
            store: Arc::new(store),
            workers: Arc::new(WorkerSet::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            local_addr: self.local_addr,
            workers: Arc::clone(&self.workers),
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Start the server (blocking)
    ///
    /// Returns after `shutdown` is requested, or on an accept error that is
    /// neither specific to a single connection nor a shortage of resources. Sessions still running at that
    /// point are left to finish on their own.
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "serving {} on {}",
            self.store.root().display(),
            self.local_addr
        );

        let reaper = self.workers.start_reaper()?;
        let result = self.accept_loop();
        reaper.stop();

        tracing::info!(
            "accept loop finished, {} sessions still open",
            self.workers.pending_count()
        );
        result
    }

    /// Signal the server to stop accepting
    pub fn shutdown(&self) {
        self.handle().shutdown();
    }

    fn accept_loop(&self) -> Result<()> {
        loop {
            let accepted = transport::accept(&self.listener);

            if self.shutdown.load(Ordering::SeqCst) {
                tracing::debug!("shutdown requested");
                return Ok(());
            }

            let (stream, peer) = match accepted {
                Ok(accepted) => accepted,
                Err(CixError::Io(ref e))
                    if matches!(
                        e.kind(),
                        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset
                    ) =>
                {
                    tracing::debug!("connection aborted before accept: {}", e);
                    continue;
                }
                Err(CixError::Io(ref e)) if transport::is_resource_exhausted(e) => {
                    tracing::warn!("accept failed, retrying: {}", e);
                    self.reap_finished();
                    thread::sleep(ACCEPT_BACKOFF);
                    continue;
                }
                Err(e) => {
                    tracing::error!("accept failed: {}", e);
                    return Err(e);
                }
            };

            tracing::info!("accepted {}", peer);
            match self.spawn_session(stream) {
                Ok(id) => tracing::debug!("session {} started for {}", id, peer),
                Err(e) => tracing::error!("failed to start worker for {}: {}", peer, e),
            }

            self.reap_finished();
        }
    }

    fn reap_finished(&self) {
        let reaped = self.workers.reap_finished();
        if reaped > 0 {
            tracing::debug!("reaped {} finished workers", reaped);
        }
    }

    /// Move an accepted stream into a new worker
    fn spawn_session(&self, stream: TcpStream) -> Result<u64> {
        let store = Arc::clone(&self.store);
        let max_payload = self.config.max_payload;
        let read_timeout_ms = self.config.read_timeout_ms;
        let write_timeout_ms = self.config.write_timeout_ms;

        self.workers.spawn(move |id| {
            let mut session = match Session::new(id, stream, store, max_payload) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("session {}: setup failed: {}", id, e);
                    return;
                }
            };
            if let Err(e) = session.set_timeouts(read_timeout_ms, write_timeout_ms) {
                tracing::warn!("session {}: cannot set timeouts: {}", id, e);
                return;
            }
            if let Err(e) = session.handle() {
                tracing::warn!("session {} ended with error: {}", id, e);
            }
        })
    }
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of session workers not yet reaped
    pub fn pending_workers(&self) -> usize {
        self.workers.pending_count()
    }

    /// Ask the accept loop to stop, waking it with a throwaway connection
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = TcpStream::connect(wake_addr(self.local_addr));
    }
}

/// A connectable address for the listener, even when bound to a wildcard
fn wake_addr(addr: SocketAddr) -> SocketAddr {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port())
}
