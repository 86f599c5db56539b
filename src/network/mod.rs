//! Network Module
//!
//! TCP server and per-connection handling.
//!
//! ## Architecture
//! - Single acceptor thread, owns the listening socket
//! - One worker thread per session
//! - Reaper thread joins finished workers

mod server;
mod session;
mod workers;

pub use server::{Server, ServerHandle};
pub use session::Session;
pub use workers::{Reaper, WorkerId, WorkerSet};
