//! Splitting student code out of marker-delimited templates.
//!
//! Assignment templates mark the region students edit:
//!
//! ```text
//! public class Task1 {
//!     // StartStudentCode
//!     ...student code...
//!     // EndStudentCode
//! }
//! ```
//!
//! [`extract_code`] splits a source into the parts before, inside and after
//! the markers. [`merge_code`] transplants a student's region into a clean
//! copy of the template, so graders can discard any edits made outside it.

/// Default start marker.
pub const DEFAULT_START_MARKER: &str = "// StartStudentCode";
/// Default end marker.
pub const DEFAULT_END_MARKER: &str = "// EndStudentCode";

/// Start and end lines delimiting the student region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMarkers {
    /// Line that opens the student region (compared after trimming).
    pub start: String,
    /// Line that closes the student region (compared after trimming).
    pub end: String,
}

impl CodeMarkers {
    /// Create a marker pair.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for CodeMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_START_MARKER, DEFAULT_END_MARKER)
    }
}

/// A source split at its markers. Marker lines are not included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedCode {
    /// Lines before the start marker.
    pub pre: String,
    /// Lines between the markers.
    pub code: String,
    /// Lines after the end marker.
    pub post: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Region {
    Pre,
    Code,
    Post,
}

/// Split `source` into the parts before, inside, and after the markers.
///
/// Only the first start marker and the first end marker after it count.
/// A source without a start marker is all `pre`; one without an end marker
/// after the start is `pre` and `code`.
///
/// ```
/// use automarking_harness::code::{CodeMarkers, extract_code};
///
/// let source = "a\n  // StartStudentCode\nb\n// EndStudentCode\nc";
/// let parts = extract_code(source, &CodeMarkers::default());
/// assert_eq!((parts.pre.as_str(), parts.code.as_str(), parts.post.as_str()), ("a", "b", "c"));
/// ```
pub fn extract_code(source: &str, markers: &CodeMarkers) -> ExtractedCode {
    let mut pre = Vec::new();
    let mut code = Vec::new();
    let mut post = Vec::new();
    let mut region = Region::Pre;

    for line in source.lines() {
        match region {
            Region::Pre if line.trim() == markers.start => region = Region::Code,
            Region::Code if line.trim() == markers.end => region = Region::Post,
            Region::Pre => pre.push(line),
            Region::Code => code.push(line),
            Region::Post => post.push(line),
        }
    }

    ExtractedCode {
        pre: pre.join("\n"),
        code: code.join("\n"),
        post: post.join("\n"),
    }
}

/// Replace the student region of `base` with the student region of `overlay`.
///
/// The result is `base.pre`, `overlay.code` and `base.post` joined with
/// newlines. The marker lines themselves are dropped.
pub fn merge_code(base: &str, overlay: &str, markers: &CodeMarkers) -> String {
    let base = extract_code(base, markers);
    let overlay = extract_code(overlay, markers);
    [base.pre, overlay.code, base.post].join("\n")
}
