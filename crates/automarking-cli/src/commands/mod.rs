//! Subcommand handlers.

pub mod config;
pub mod list;
pub mod mark;
pub mod merge;

pub use config::handle_config_command;
pub use list::cmd_list;
pub use mark::cmd_mark;
pub use merge::cmd_merge;
