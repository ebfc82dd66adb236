//! Error types for the automarking core library.

use std::path::{Path, PathBuf};

/// Errors that can occur while reading submissions and grade columns.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error (file operations, work directory creation, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path
    #[error("I/O error at {path}: {source}")]
    IoPath {
        /// Path that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive error (gradebook or student submission)
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Archive could not be read
    #[error("Archive error in {path}: {message}")]
    Archive {
        /// Archive that failed
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Submission spec pattern did not compile
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        /// The offending regular expression
        pattern: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// A required column is missing from the grade column CSV
    #[error("Missing column in grade column CSV: {column}")]
    MissingColumn {
        /// Name (or name fragment) of the missing column
        column: String,
    },
}

/// Convenience `Result` type alias for automarking operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates an I/O error that records the path involved.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::IoPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new archive error.
    pub fn archive<S: Into<String>>(path: impl AsRef<Path>, message: S) -> Self {
        Error::Archive {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a new missing column error.
    pub fn missing_column<S: Into<String>>(column: S) -> Self {
        Error::MissingColumn {
            column: column.into(),
        }
    }

    /// Returns whether this error only affects a single student submission.
    ///
    /// [`Submission::extract`](crate::Submission::extract) logs and skips
    /// submission-local errors; everything else aborts the load.
    pub fn is_submission_local(&self) -> bool {
        match self {
            Error::Archive { .. } => true,
            Error::Zip(_) => true,
            Error::Io(_) | Error::IoPath { .. } => false,
            Error::Csv(_) => false,
            Error::Pattern { .. } => false,
            Error::MissingColumn { .. } => false,
        }
    }
}
