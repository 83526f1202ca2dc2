use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{reload, EnvFilter, Registry};

use draughts_ai::config::{bootstrap_log_level, load_config};
use draughts_ai::protocol::ProtocolHandler;

/// Draughts engine speaking a line-based text protocol on stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "draughts-ai", version)]
struct Args {
    /// Search depth in plies, overrides the config file
    #[arg(long)]
    depth: Option<u32>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "draughts_ai=trace")
    #[arg(long)]
    log_level: Option<String>,
}

/// Installs the subscriber. The returned handle swaps the filter once the
/// config file has been read.
fn init_tracing(level: &str) -> Result<reload::Handle<EnvFilter, Registry>> {
    use tracing_subscriber::{fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (filter, handle) = reload::Layer::new(filter);

    // stdout carries the protocol
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(handle)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Up before the config loader so its warnings are visible
    let bootstrap_level =
        bootstrap_log_level(args.log_level.as_deref(), |key| std::env::var(key).ok());
    let filter_handle = init_tracing(&bootstrap_level)?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(depth) = args.depth {
        config.search.depth = depth;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    config.validate()?;

    if std::env::var("RUST_LOG").is_err() && config.log_level != bootstrap_level {
        filter_handle.reload(EnvFilter::new(&config.log_level))?;
    }
    info!(
        depth = config.search.depth,
        longest_capture = config.rules.longest_capture_mandatory,
        log_level = %config.log_level,
        "Engine starting"
    );

    let mut handler = ProtocolHandler::new(&config)?;
    handler.run()
}
