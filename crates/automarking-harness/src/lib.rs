#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Automarking Harness
//!
//! Helpers for marking extracted submission files: pulling the student
//! region out of template-based sources and running test commands whose
//! outcome becomes the file's score and feedback.

pub mod code;
pub mod error;
pub mod runner;

// Re-exports for convenience
pub use code::{CodeMarkers, ExtractedCode, extract_code, merge_code};
pub use error::{Error, Result};
pub use runner::{TestOutcome, TestRunner, TestStatus};
