//! sitescope - website auditor CLI and server

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = sitescope::cli::Cli::parse();

    // Initialize logging (RUST_LOG wins over --log-level)
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .init();

    sitescope::cli::run(cli)
}
