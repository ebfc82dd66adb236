//! The `merge` subcommand.

use std::path::Path;

use anyhow::{Context, Result};
use automarking_harness::{CodeMarkers, merge_code};

/// Merge the student region of `overlay` into `base`.
pub fn merge_files(base: &Path, overlay: &Path, markers: &CodeMarkers) -> Result<String> {
    let base = std::fs::read_to_string(base)
        .with_context(|| format!("Failed to read {}", base.display()))?;
    let overlay = std::fs::read_to_string(overlay)
        .with_context(|| format!("Failed to read {}", overlay.display()))?;
    Ok(merge_code(&base, &overlay, markers))
}

/// Handle `automark merge`.
pub fn cmd_merge(base: &str, overlay: &str, start: &str, end: &str) -> Result<()> {
    let merged = merge_files(Path::new(base), Path::new(overlay), &CodeMarkers::new(start, end))?;
    println!("{merged}");
    Ok(())
}
