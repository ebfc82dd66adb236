//! # automarking-cli
//!
//! The `automark` command-line tool:
//! - `mark`: extract submissions, run configured tests, write grades
//! - `list`: show what was extracted from each submission
//! - `merge`: merge a student region into a template
//! - `config`: create and locate the TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;

use anyhow::Result;

use cli::{Cli, Command};
use config::{MarkingConfig, resolve_config_path};

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Mark { dry_run } => {
            let config = MarkingConfig::load(&resolve_config_path(config_path))?;
            commands::cmd_mark(&config, dry_run).await
        }
        Command::List { json } => {
            let config = MarkingConfig::load(&resolve_config_path(config_path))?;
            commands::cmd_list(&config, json)
        }
        Command::Merge {
            base,
            overlay,
            start,
            end,
        } => commands::cmd_merge(&base, &overlay, &start, &end),
        Command::Config { action } => commands::handle_config_command(config_path, action),
    }
}
