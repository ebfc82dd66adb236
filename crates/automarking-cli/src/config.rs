//! Marking configuration loaded from a TOML file.
//!
//! ```toml
//! gradebook = "gradebook.zip"
//! grade_column = "grades.csv"
//! work_dir = "tmp"
//!
//! [[specs]]
//! identifier = "task1"
//! title = "Task 1"
//! pattern = "^Task1\\.java$"
//!
//! [specs.test]
//! command = "bash"
//! args = ["run-tests.sh", "{file}"]
//! ```
//!
//! Relative paths are resolved against the directory holding the config
//! file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use automarking_core::SubmissionSpec;
use automarking_harness::{CodeMarkers, TestRunner};
use serde::{Deserialize, Serialize};

/// Config file used when neither `--config` nor `AUTOMARK_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = "automark.toml";

/// Top-level marking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingConfig {
    /// Blackboard gradebook zip.
    pub gradebook: PathBuf,
    /// Blackboard grade column CSV; rewritten after marking.
    pub grade_column: PathBuf,
    /// Directory submission archives are copied into.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Directory test inputs are written to; defaults to `<work_dir>/scratch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Files to extract from each submission.
    #[serde(default)]
    pub specs: Vec<SpecConfig>,
}

/// One `[[specs]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Spec identifier.
    pub identifier: String,
    /// Title used to label feedback.
    pub title: String,
    /// Basename regex, or one regex per path component.
    pub pattern: PatternConfig,
    /// Test run against every matched file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<TestConfig>,
}

/// A spec pattern as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternConfig {
    /// `pattern = "regex"`
    Basename(String),
    /// `pattern = ["dir-regex", "file-regex"]`
    Components(Vec<String>),
}

/// The `[specs.test]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Program to run.
    pub command: String,
    /// Arguments; `{file}`, `{filename}`, `{dir}` and `{student}` are substituted.
    #[serde(default)]
    pub args: Vec<String>,
    /// Timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Score for a passing test.
    #[serde(default = "default_pass_score")]
    pub pass_score: f64,
    /// Score for a failing or timed out test.
    #[serde(default = "default_fail_score")]
    pub fail_score: f64,
    /// Template the student region is merged into before testing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// Marker lines delimiting the student region in the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<MarkersConfig>,
}

/// Custom student region markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkersConfig {
    /// Start marker line.
    pub start: String,
    /// End marker line.
    pub end: String,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(automarking_core::BlackboardDataSource::DEFAULT_WORK_DIR)
}

fn default_timeout_secs() -> u64 {
    TestRunner::DEFAULT_TIMEOUT.as_secs()
}

fn default_pass_score() -> f64 {
    2.0
}

fn default_fail_score() -> f64 {
    1.0
}

impl Default for MarkingConfig {
    fn default() -> Self {
        Self {
            gradebook: PathBuf::from("gradebook.zip"),
            grade_column: PathBuf::from("grades.csv"),
            work_dir: default_work_dir(),
            scratch_dir: None,
            specs: vec![SpecConfig {
                identifier: "task1".to_string(),
                title: "Task 1".to_string(),
                pattern: PatternConfig::Basename(r"^Task1\.java$".to_string()),
                test: Some(TestConfig {
                    command: "bash".to_string(),
                    args: vec!["run-tests.sh".to_string(), "{file}".to_string()],
                    timeout_secs: default_timeout_secs(),
                    pass_score: default_pass_score(),
                    fail_score: default_fail_score(),
                    template: None,
                    markers: None,
                }),
            }],
        }
    }
}

impl MarkingConfig {
    /// Load a config file and resolve its relative paths.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolved_against(base))
    }

    /// Parse a config from TOML text without resolving paths.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialise to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check identifiers are present and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for spec in &self.specs {
            anyhow::ensure!(!spec.identifier.is_empty(), "Spec identifier must not be empty");
            anyhow::ensure!(
                seen.insert(spec.identifier.as_str()),
                "Duplicate spec identifier '{}'",
                spec.identifier
            );
        }
        Ok(())
    }

    /// Join every relative path onto `base`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.gradebook);
        resolve(&mut self.grade_column);
        resolve(&mut self.work_dir);
        if let Some(dir) = self.scratch_dir.as_mut() {
            resolve(dir);
        }
        for template in self
            .specs
            .iter_mut()
            .filter_map(|s| s.test.as_mut())
            .filter_map(|t| t.template.as_mut())
        {
            resolve(template);
        }
        self
    }

    /// Directory test inputs are written to.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| self.work_dir.join("scratch"))
    }

    /// Compile the configured specs.
    pub fn submission_specs(&self) -> Result<Vec<SubmissionSpec>> {
        self.specs.iter().map(SpecConfig::to_spec).collect()
    }

    /// The spec entry with the given identifier.
    pub fn spec(&self, identifier: &str) -> Option<&SpecConfig> {
        self.specs.iter().find(|s| s.identifier == identifier)
    }
}

impl SpecConfig {
    /// Compile this entry into a [`SubmissionSpec`].
    pub fn to_spec(&self) -> Result<SubmissionSpec> {
        let spec = match &self.pattern {
            PatternConfig::Basename(pattern) => {
                SubmissionSpec::new(&self.identifier, &self.title, pattern)
            }
            PatternConfig::Components(patterns) => {
                SubmissionSpec::with_components(&self.identifier, &self.title, patterns.as_slice())
            }
        };
        spec.with_context(|| format!("Invalid pattern for spec '{}'", self.identifier))
    }
}

impl TestConfig {
    /// Build a runner with this test's timeout and scores.
    pub fn runner(&self) -> TestRunner {
        TestRunner::new()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_pass_score(self.pass_score)
            .with_fail_score(self.fail_score)
    }

    /// Student region markers, falling back to the defaults.
    pub fn code_markers(&self) -> CodeMarkers {
        self.markers
            .as_ref()
            .map(|m| CodeMarkers::new(&m.start, &m.end))
            .unwrap_or_default()
    }
}

/// Resolve the config file path from the CLI argument.
pub fn resolve_config_path(config_path: Option<&str>) -> PathBuf {
    PathBuf::from(config_path.unwrap_or(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
gradebook = "export/gradebook.zip"
grade_column = "/abs/grades.csv"

[[specs]]
identifier = "task1"
title = "Task 1"
pattern = '^Task1\.java$'

[specs.test]
command = "bash"
args = ["run.sh", "{file}"]
template = "templates/Task1.java"

[[specs]]
identifier = "task2"
title = "Task 2"
pattern = ["^src$", '\.py$']
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = MarkingConfig::from_toml(CONFIG).unwrap();
        assert_eq!(config.work_dir, PathBuf::from("tmp"));
        assert_eq!(config.specs.len(), 2);
        let test = config.specs[0].test.as_ref().unwrap();
        assert_eq!(test.timeout_secs, 60);
        assert_eq!(test.pass_score, 2.0);
        assert_eq!(test.fail_score, 1.0);
        assert_eq!(test.code_markers(), CodeMarkers::default());
        assert_eq!(
            config.specs[1].pattern,
            PatternConfig::Components(vec!["^src$".to_string(), r"\.py$".to_string()])
        );
        assert!(config.specs[1].test.is_none());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let config = MarkingConfig::from_toml(CONFIG)
            .unwrap()
            .resolved_against(Path::new("/course"));
        assert_eq!(config.gradebook, PathBuf::from("/course/export/gradebook.zip"));
        assert_eq!(config.grade_column, PathBuf::from("/abs/grades.csv"));
        assert_eq!(config.work_dir, PathBuf::from("/course/tmp"));
        assert_eq!(config.scratch_dir(), PathBuf::from("/course/tmp/scratch"));
        assert_eq!(
            config.specs[0].test.as_ref().unwrap().template,
            Some(PathBuf::from("/course/templates/Task1.java"))
        );
    }

    #[test]
    fn test_submission_specs_compile() {
        let config = MarkingConfig::from_toml(CONFIG).unwrap();
        let specs = config.submission_specs().unwrap();
        assert!(specs[0].matches("dir/Task1.java"));
        assert!(specs[1].matches("src/a.py"));
        assert!(!specs[1].matches("a.py"));
    }

    #[test]
    fn test_invalid_pattern_is_reported_with_spec() {
        let config = MarkingConfig::from_toml(
            "gradebook = \"g\"\ngrade_column = \"c\"\n[[specs]]\nidentifier = \"bad\"\ntitle = \"B\"\npattern = \"(\"\n",
        )
        .unwrap();
        let err = config.submission_specs().unwrap_err();
        assert!(err.to_string().contains("'bad'"));
    }

    #[test]
    fn test_duplicate_identifiers_rejected() {
        let toml = "gradebook = \"g\"\ngrade_column = \"c\"\n\
                    [[specs]]\nidentifier = \"a\"\ntitle = \"A\"\npattern = \"x\"\n\
                    [[specs]]\nidentifier = \"a\"\ntitle = \"B\"\npattern = \"y\"\n";
        let err = MarkingConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("Duplicate spec identifier 'a'"));
    }

    #[test]
    fn test_default_config_round_trips() {
        let config = MarkingConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(MarkingConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_custom_markers() {
        let test = TestConfig {
            command: "true".to_string(),
            args: vec![],
            timeout_secs: 1,
            pass_score: 1.0,
            fail_score: 0.0,
            template: None,
            markers: Some(MarkersConfig {
                start: "# BEGIN".to_string(),
                end: "# END".to_string(),
            }),
        };
        assert_eq!(test.code_markers(), CodeMarkers::new("# BEGIN", "# END"));
        assert_eq!(test.runner().timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_resolve_config_path() {
        assert_eq!(resolve_config_path(None), PathBuf::from("automark.toml"));
        assert_eq!(resolve_config_path(Some("x.toml")), PathBuf::from("x.toml"));
    }
}
