//! Shared CLI/logging setup for bog's binaries.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Common CLI arguments: the YAML parameter file and log level (§6: "the
/// process exposes no CLI beyond parameter-file path").
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// Path to the YAML configuration document (§6).
    #[arg(short, long, default_value = "config/default.yaml")]
    pub config: String,

    /// Log level, overridable via `RUST_LOG`.
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}
