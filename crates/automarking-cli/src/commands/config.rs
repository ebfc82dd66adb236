//! Handler functions for config CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::config::{MarkingConfig, resolve_config_path};

/// Handle a config subcommand.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Init { file, force } => {
            let path = file
                .map(PathBuf::from)
                .unwrap_or_else(|| resolve_config_path(config_path));
            cmd_config_init(&path, force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

/// Show the resolved config file path.
pub fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = resolve_config_path(config_path);
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist - run `automark config init` to create it)");
    }
    Ok(())
}

/// Create a default configuration file at `path`.
pub fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let toml_str = MarkingConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
