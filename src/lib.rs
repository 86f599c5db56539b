//! # cix
//!
//! Remote file access over a persistent TCP connection:
//! - Fixed 64-byte binary header, optional payload
//! - LIST / FETCH / STORE / DELETE against a flat server directory
//! - Thread-per-session server with asynchronous worker reaping
//! - Interactive line-oriented client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────────────────────┐
//! │  Client Engine   │                    │        Accept Loop           │
//! │ (stdin commands) │                    │   (owns the listener)        │
//! └────────┬─────────┘                    └──────┬───────────────┬───────┘
//!          │                                     │ spawn         │ exit notices
//!          ▼                                     ▼               ▼
//! ┌──────────────────┐    header+payload  ┌─────────────┐  ┌────────────┐
//! │    Transport     │◀──────────────────▶│  Session    │  │   Reaper   │
//! │ (exact send/recv)│                    │ (1 thread)  │  │            │
//! └──────────────────┘                    └──────┬──────┘  └────────────┘
//!                                                ▼
//!                                         ┌─────────────┐
//!                                         │  FileStore  │
//!                                         │ (root dir)  │
//!                                         └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transport;
pub mod storage;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::{ClientConfig, Config};
pub use error::{CixError, Result};
pub use network::{Server, ServerHandle};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cix
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
