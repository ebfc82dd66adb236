//! Command-line argument definitions.

use clap::{Parser, Subcommand};

/// Automark - mark Blackboard assignment submissions
#[derive(Parser, Debug)]
#[command(name = "automark")]
#[command(author, version, about = "Automatic marking of Blackboard assignment submissions", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AUTOMARK_CONFIG", global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract submissions, run the configured tests, and write grades
    Mark {
        /// Run the tests but leave the grade column untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// List extracted submissions and their matched files
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Merge the student region of one file into a template
    Merge {
        /// Template providing everything outside the student region
        #[arg(long)]
        base: String,
        /// File providing the student region
        #[arg(long)]
        overlay: String,
        /// Start marker line
        #[arg(long, default_value = automarking_harness::code::DEFAULT_START_MARKER)]
        start: String,
        /// End marker line
        #[arg(long, default_value = automarking_harness::code::DEFAULT_END_MARKER)]
        end: String,
    },
    /// Configuration file operations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Create a default configuration file
    Init {
        /// Where to write the file (defaults to the resolved config path)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
