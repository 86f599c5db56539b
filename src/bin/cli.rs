//! cix Client
//!
//! Interactive client: reads commands from stdin until `exit` or EOF.

use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::Parser;
use cix::config::{DEFAULT_HOST, DEFAULT_PORT};
use cix::{transport, Client, ClientConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// cix CLI
#[derive(Parser, Debug)]
#[command(name = "cix")]
#[command(about = "Interactive client for a cix file server")]
#[command(version)]
#[command(after_help = "To pick a port, give the host first: `cix localhost 9000`.")]
struct Args {
    /// Server host (required before PORT; a lone number is read as a host)
    #[arg(env = "CIX_SERVER_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(env = "CIX_SERVER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Local directory for get/put
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
}

fn main() {
    // Logs go to stderr so they never interleave with listings on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("connecting to {}", addr);

    let stream = match transport::connect(&addr) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("cix: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("connected to {}", addr);

    let config = ClientConfig::builder().local_dir(&args.dir).build();
    let mut client = Client::new(stream, config);

    let stdin = io::stdin();
    let mut stdout = BufWriter::new(io::stdout());

    if let Err(e) = client.run(stdin.lock(), &mut stdout) {
        drop(stdout);
        eprintln!("cix: {}", e);
        std::process::exit(1);
    }

    tracing::info!("finishing");
}
