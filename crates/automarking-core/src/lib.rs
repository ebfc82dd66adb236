#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Automarking Core Library
//!
//! Submission specs, archive readers, and the Blackboard data source used
//! to extract student submissions and write marks back.
//!
//! # Modules
//!
//! - [`spec`]: which files to extract from each submission
//! - [`archive`]: zip, tar.gz, tar.bz2 and rar readers
//! - [`submission`]: submissions and their matched files
//! - [`gradebook`]: Blackboard gradebook import and grade column export
//! - [`error`]: Error types and Result alias

pub mod archive;
pub mod error;
pub mod gradebook;
mod proptests;
pub mod spec;
pub mod submission;

// Re-exports for convenience
pub use archive::{ArchiveFormat, ArchiveMember};
pub use error::{Error, Result};
pub use gradebook::{BlackboardDataSource, GradeColumn};
pub use spec::{Pattern, SubmissionSpec};
pub use submission::{Submission, SubmissionFile};
