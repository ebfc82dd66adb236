//! Submission specs: which files to pull out of each student's submission.
//!
//! A [`SubmissionSpec`] pairs an identifier and a feedback title with a
//! [`Pattern`] that is tested against archive member paths:
//!
//! ```
//! use automarking_core::SubmissionSpec;
//!
//! let spec = SubmissionSpec::new("task1", "Task 1", r"^Task1\.java$").unwrap();
//! assert!(spec.matches("submission/src/Task1.java"));
//!
//! let nested = SubmissionSpec::with_components("task2", "Task 2", &["^src$", r"\.java$"]).unwrap();
//! assert!(nested.matches("src/Main.java"));
//! assert!(!nested.matches("project/src/Main.java"));
//! ```

use regex::Regex;

use crate::error::{Error, Result};

/// How a spec is matched against an archive member path.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Searched in the basename of the path only.
    Basename(Regex),
    /// Searched component-wise; the path must have exactly as many
    /// `/`-separated components as there are patterns.
    Components(Vec<Regex>),
}

impl Pattern {
    /// Compile a basename pattern.
    pub fn basename(pattern: &str) -> Result<Self> {
        compile(pattern).map(Pattern::Basename)
    }

    /// Compile a component-wise pattern.
    pub fn components<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        patterns
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Pattern::Components)
    }

    /// Test whether `path` is matched.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Basename(regex) => regex.is_match(basename(path)),
            Pattern::Components(regexes) => {
                let parts: Vec<&str> = path.split('/').collect();
                parts.len() == regexes.len()
                    && parts
                        .iter()
                        .zip(regexes)
                        .all(|(part, regex)| regex.is_match(part))
            }
        }
    }
}

/// Specifies one file to extract from each student's submission.
#[derive(Debug, Clone)]
pub struct SubmissionSpec {
    identifier: String,
    title: String,
    pattern: Pattern,
}

impl SubmissionSpec {
    /// Create a spec matching the basename of member paths.
    pub fn new(identifier: impl Into<String>, title: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self::from_pattern(identifier, title, Pattern::basename(pattern)?))
    }

    /// Create a spec matching member paths component by component.
    pub fn with_components<S: AsRef<str>>(
        identifier: impl Into<String>,
        title: impl Into<String>,
        patterns: &[S],
    ) -> Result<Self> {
        Ok(Self::from_pattern(identifier, title, Pattern::components(patterns)?))
    }

    /// Create a spec from an already compiled pattern.
    pub fn from_pattern(identifier: impl Into<String>, title: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            pattern,
        }
    }

    /// The spec identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The title used to label feedback.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The match pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Test whether the member path is matched by this spec.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    /// The three banner lines that head this spec's feedback.
    pub fn title_banner(&self) -> [String; 3] {
        let rule = "#".repeat(self.title.chars().count());
        [rule.clone(), self.title.clone(), rule]
    }
}

/// The part of `path` after the last `/`.
pub(crate) fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
