//! Automarking - umbrella crate.
//!
//! Provides shortcut access to [`SubmissionSpec`] and
//! [`BlackboardDataSource`], plus the component crates under their own
//! names. The `harness` feature (on by default) adds code merging and the
//! test runner.
//!
//! ```no_run
//! use automarking::{BlackboardDataSource, SubmissionSpec};
//!
//! # fn main() -> automarking::Result<()> {
//! let spec = SubmissionSpec::new("task1", "Task 1", r"^Task1\.java$")?;
//! let source = BlackboardDataSource::open("gradebook.zip", "grades.csv", [spec])?;
//! println!("{} submissions", source.submissions().len());
//! # Ok(())
//! # }
//! ```

pub use automarking_core as core;
pub use automarking_core::{BlackboardDataSource, Error, Result, SubmissionSpec};

#[cfg(feature = "harness")]
pub use automarking_harness as harness;
