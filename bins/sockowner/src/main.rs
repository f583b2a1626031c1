//! sockowner command - find the process owning a connection.
//!
//! Looks the connection up through the kernel's socket diagnostics and
//! prints the executable of the process holding the socket.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use sockowner::{Resolver, ResolverConfig};

#[derive(Parser)]
#[command(
    name = "sockowner",
    version,
    about = "Find the process owning a TCP or UDP connection"
)]
struct Cli {
    /// Transport protocol (tcp or udp).
    network: String,

    /// Local endpoint, e.g. 127.0.0.1:51000 or [::1]:51000.
    local: SocketAddr,

    /// Remote endpoint.
    remote: SocketAddr,

    /// Output the process record in JSON format.
    #[arg(short = 'j', long)]
    json: bool,

    /// Process-information root to search instead of /proc.
    #[arg(long, value_name = "DIR")]
    proc_root: Option<PathBuf>,

    /// Read resolver settings from a JSON file.
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log pipeline stages to stderr.
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ResolverConfig::default(),
    };
    if let Some(root) = cli.proc_root {
        config = config.proc_root(root);
    }

    let resolver = Resolver::with_config(config.normalized());
    let network = cli.network.parse()?;
    let record = resolver.resolve_record(network, cli.local, cli.remote)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", record.path.display());
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ResolverConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}
