//! The `list` subcommand: show what was extracted from each submission.

use std::path::PathBuf;

use anyhow::{Context, Result};
use automarking_core::{ArchiveFormat, BlackboardDataSource, Submission};
use serde::Serialize;

use crate::config::MarkingConfig;

/// One submission in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionListing {
    /// Student number.
    pub student_id: String,
    /// Copied archive in the work directory.
    pub archive: PathBuf,
    /// Archive format.
    pub format: Option<ArchiveFormat>,
    /// Matched files.
    pub files: Vec<FileListing>,
}

/// One matched file in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    /// Identifier of the matching spec.
    pub spec: String,
    /// Member path inside the archive.
    pub path: String,
    /// Size in bytes.
    pub bytes: usize,
}

impl From<&Submission> for SubmissionListing {
    fn from(submission: &Submission) -> Self {
        Self {
            student_id: submission.student_id().to_string(),
            archive: submission.archive().to_path_buf(),
            format: submission.format(),
            files: submission
                .files()
                .iter()
                .map(|f| FileListing {
                    spec: f.spec().identifier().to_string(),
                    path: f.path().to_string(),
                    bytes: f.contents().len(),
                })
                .collect(),
        }
    }
}

/// Load the gradebook and describe every submission.
pub fn collect_listing(config: &MarkingConfig) -> Result<Vec<SubmissionListing>> {
    let source = BlackboardDataSource::new(
        &config.gradebook,
        &config.grade_column,
        config.submission_specs()?,
    )
    .with_work_dir(&config.work_dir)
    .load()
    .context("Failed to load gradebook")?;
    Ok(source.submissions().iter().map(SubmissionListing::from).collect())
}

/// Handle `automark list`.
pub fn cmd_list(config: &MarkingConfig, json: bool) -> Result<()> {
    let listing = collect_listing(config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    for submission in &listing {
        let format = submission
            .format
            .map_or_else(|| "-".to_string(), |f| f.to_string());
        println!(
            "{} ({}, {} files)",
            submission.student_id,
            format,
            submission.files.len()
        );
        for file in &submission.files {
            println!("  [{}] {} ({} bytes)", file.spec, file.path, file.bytes);
        }
    }
    Ok(())
}
