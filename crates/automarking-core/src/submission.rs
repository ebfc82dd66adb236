//! Student submissions and the files matched inside them.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{self, ArchiveFormat, ArchiveMember};
use crate::error::Result;
use crate::spec::{SubmissionSpec, basename};

/// One archive member matched by a [`SubmissionSpec`], with its marking state.
#[derive(Debug, Clone)]
pub struct SubmissionFile {
    spec: Arc<SubmissionSpec>,
    path: String,
    contents: Vec<u8>,
    score: f64,
    feedback: Vec<String>,
}

impl SubmissionFile {
    /// Create an unmarked file for `spec`.
    pub fn new(spec: Arc<SubmissionSpec>, path: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            spec,
            path: path.into(),
            contents,
            score: 0.0,
            feedback: Vec::new(),
        }
    }

    /// The spec this file was matched by.
    pub fn spec(&self) -> &SubmissionSpec {
        &self.spec
    }

    /// Full member path inside the submission archive.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Basename of the member path.
    pub fn filename(&self) -> &str {
        basename(&self.path)
    }

    /// Raw file contents.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// File contents decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }

    /// Score awarded for this file.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Set the score awarded for this file.
    pub fn set_score(&mut self, score: f64) {
        self.score = score;
    }

    /// Feedback entries recorded for this file.
    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    /// Append a feedback entry.
    pub fn add_feedback(&mut self, entry: impl Into<String>) {
        self.feedback.push(entry.into());
    }

    /// The spec's title banner followed by this file's feedback.
    ///
    /// The banner is emitted even when no feedback was recorded.
    pub fn feedback_block(&self) -> Vec<String> {
        let mut block: Vec<String> = self.spec.title_banner().into();
        block.extend(self.feedback.iter().cloned());
        block
    }
}

/// A single student's submission.
#[derive(Debug, Clone)]
pub struct Submission {
    student_id: String,
    archive: PathBuf,
    format: Option<ArchiveFormat>,
    files: Vec<SubmissionFile>,
}

impl Submission {
    /// Create a submission without files.
    pub fn new(student_id: impl Into<String>, archive: impl Into<PathBuf>) -> Self {
        Self {
            student_id: student_id.into(),
            archive: archive.into(),
            format: None,
            files: Vec::new(),
        }
    }

    /// Read the archive and collect every member matched by `specs`.
    ///
    /// Files are ordered by spec first and archive order second, so a member
    /// matched by two specs appears twice. A corrupt archive yields a
    /// submission without files; I/O failures on the archive file are
    /// returned.
    pub fn extract(
        student_id: impl Into<String>,
        archive: impl Into<PathBuf>,
        format: ArchiveFormat,
        specs: &[Arc<SubmissionSpec>],
    ) -> Result<Self> {
        let mut submission = Self::new(student_id, archive);
        submission.format = Some(format);
        match archive::read_members(&submission.archive, format) {
            Ok(members) => submission.files = match_members(specs, members),
            Err(e) if e.is_submission_local() => tracing::warn!(
                student = %submission.student_id,
                archive = %submission.archive.display(),
                error = %e,
                "Could not read submission archive"
            ),
            Err(e) => return Err(e),
        }
        tracing::debug!(
            student = %submission.student_id,
            files = submission.files.len(),
            "Submission extracted"
        );
        Ok(submission)
    }

    /// Student number this submission belongs to.
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Path of the archive the files were read from.
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Archive format, if the submission was extracted from an archive.
    pub fn format(&self) -> Option<ArchiveFormat> {
        self.format
    }

    /// Matched files.
    pub fn files(&self) -> &[SubmissionFile] {
        &self.files
    }

    /// Matched files, for marking.
    pub fn files_mut(&mut self) -> &mut [SubmissionFile] {
        &mut self.files
    }

    /// Add a matched file.
    pub fn push_file(&mut self, file: SubmissionFile) {
        self.files.push(file);
    }

    /// Files matched by the spec with the given identifier.
    pub fn files_for<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a SubmissionFile> {
        self.files
            .iter()
            .filter(move |f| f.spec().identifier() == identifier)
    }

    /// Total score over all files.
    pub fn score(&self) -> f64 {
        self.files.iter().map(SubmissionFile::score).sum()
    }

    /// Feedback blocks of all files, in file order.
    pub fn feedback(&self) -> Vec<String> {
        self.files
            .iter()
            .flat_map(SubmissionFile::feedback_block)
            .collect()
    }

    /// Feedback joined into a single text with newlines.
    pub fn feedback_text(&self) -> String {
        self.feedback().join("\n")
    }
}

fn match_members(specs: &[Arc<SubmissionSpec>], members: Vec<ArchiveMember>) -> Vec<SubmissionFile> {
    let mut files = Vec::new();
    for spec in specs {
        for member in &members {
            if spec.matches(&member.path) {
                files.push(SubmissionFile::new(
                    Arc::clone(spec),
                    member.path.clone(),
                    member.contents.clone(),
                ));
            }
        }
    }
    files
}
