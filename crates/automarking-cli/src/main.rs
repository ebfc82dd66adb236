//! Automark CLI
//!
//! Command-line interface for marking Blackboard assignment submissions.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use automarking_cli::cli::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,automarking=debug"
    } else {
        "warn,automarking=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    automarking_cli::run(cli).await
}
