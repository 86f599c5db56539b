//! Configuration for cix
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::protocol::DEFAULT_MAX_PAYLOAD;

/// Port used when neither the command line nor the environment names one
pub const DEFAULT_PORT: u16 = 50000;

/// Host the client connects to by default
pub const DEFAULT_HOST: &str = "localhost";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory whose files are served. The namespace is flat: only its
    /// direct children are reachable.
    pub root_dir: PathBuf,

    /// Largest payload accepted in a single STORE (in bytes)
    pub max_payload: u32,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Session read timeout (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Session write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            max_payload: DEFAULT_MAX_PAYLOAD,
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the payload limit (in bytes)
    pub fn max_payload(mut self, bytes: u32) -> Self {
        self.config.max_payload = bytes;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Directory FETCH writes into and STORE reads from
    pub local_dir: PathBuf,

    /// Largest reply payload accepted, and largest file sent (in bytes)
    pub max_payload: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            local_dir: PathBuf::from("."),
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn local_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.local_dir = path.into();
        self
    }

    pub fn max_payload(mut self, bytes: u32) -> Self {
        self.config.max_payload = bytes;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
