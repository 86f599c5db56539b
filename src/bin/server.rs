//! cix Server Binary
//!
//! Serves a directory over the cix protocol.

use std::path::PathBuf;

use clap::Parser;
use cix::config::DEFAULT_PORT;
use cix::{Config, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// cix Server
#[derive(Parser, Debug)]
#[command(name = "cixd")]
#[command(about = "Serve a directory to cix clients")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(env = "CIX_SERVER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Directory whose files are served
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Largest accepted upload, in MB
    #[arg(short = 'm', long, default_value = "64")]
    max_payload_mb: u32,

    /// Per-session read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cix=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("cixd v{}", cix::VERSION);
    tracing::info!("Storage root: {}", args.root.display());

    let listen_addr = if args.bind.contains(':') {
        format!("[{}]:{}", args.bind, args.port)
    } else {
        format!("{}:{}", args.bind, args.port)
    };

    let config = Config::builder()
        .root_dir(&args.root)
        .listen_addr(listen_addr)
        .max_payload(args.max_payload_mb.saturating_mul(1024 * 1024))
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
