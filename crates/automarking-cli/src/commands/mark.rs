//! The `mark` subcommand: extract, test, and grade every submission.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use automarking_core::{BlackboardDataSource, SubmissionFile};
use automarking_harness::{TestOutcome, merge_code};

use crate::config::{MarkingConfig, TestConfig};

/// Marking result for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentResult {
    /// Student number.
    pub student_id: String,
    /// Total score.
    pub score: f64,
    /// Number of matched files.
    pub files: usize,
    /// Number of files a test was run against.
    pub tests_run: usize,
}

/// Outcome of a marking run.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkSummary {
    /// Per-student results, in gradebook order.
    pub students: Vec<StudentResult>,
    /// Whether the grade column was rewritten.
    pub grades_written: bool,
}

/// Load the gradebook, run every configured test, and write the grades.
pub async fn run_mark(config: &MarkingConfig, dry_run: bool) -> Result<MarkSummary> {
    let specs = config.submission_specs()?;
    let mut source = BlackboardDataSource::new(&config.gradebook, &config.grade_column, specs)
        .with_work_dir(&config.work_dir)
        .load()
        .context("Failed to load gradebook")?;
    let scratch_root = config.scratch_dir();

    let mut students = Vec::new();
    for submission in source.submissions_mut() {
        let student_id = submission.student_id().to_string();
        tracing::info!(student = %student_id, files = submission.files().len(), "Marking submission");
        let mut tests_run = 0;
        for file in submission.files_mut() {
            let Some(test) = config
                .spec(file.spec().identifier())
                .and_then(|spec| spec.test.as_ref())
            else {
                continue;
            };
            mark_file(test, &scratch_root, &student_id, file).await?;
            tests_run += 1;
        }
        students.push(StudentResult {
            student_id,
            score: submission.score(),
            files: submission.files().len(),
            tests_run,
        });
    }

    if !dry_run {
        source.write_grades().context("Failed to write grade column")?;
    }
    Ok(MarkSummary {
        students,
        grades_written: !dry_run,
    })
}

/// Handle `automark mark`.
pub async fn cmd_mark(config: &MarkingConfig, dry_run: bool) -> Result<()> {
    let summary = run_mark(config, dry_run).await?;
    println!("{:<12} {:>8} {:>6} {:>6}", "STUDENT", "SCORE", "FILES", "TESTS");
    for student in &summary.students {
        println!(
            "{:<12} {:>8} {:>6} {:>6}",
            student.student_id, student.score, student.files, student.tests_run
        );
    }
    if summary.grades_written {
        println!("Grades written to {}", config.grade_column.display());
    } else {
        println!("Dry run: {} left untouched", config.grade_column.display());
    }
    Ok(())
}

/// Write `file` into the scratch directory and run its test.
async fn mark_file(
    test: &TestConfig,
    scratch_root: &Path,
    student_id: &str,
    file: &mut SubmissionFile,
) -> Result<TestOutcome> {
    let dir = scratch_root
        .join(student_id)
        .join(file.spec().identifier());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create scratch directory {}", dir.display()))?;

    let filename = scratch_filename(file);
    let target = dir.join(&filename);
    let contents = match &test.template {
        Some(template) => {
            let base = std::fs::read_to_string(template)
                .with_context(|| format!("Failed to read template {}", template.display()))?;
            merge_code(&base, &file.text(), &test.code_markers()).into_bytes()
        }
        None => file.contents().to_vec(),
    };
    std::fs::write(&target, contents)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    let placeholders = Placeholders {
        file: target,
        dir,
        filename,
        student: student_id.to_string(),
    };
    let args: Vec<String> = test.args.iter().map(|a| placeholders.substitute(a)).collect();
    let outcome = test
        .runner()
        .with_env("AUTOMARK_STUDENT", student_id)
        .with_env("AUTOMARK_FILE", placeholders.file.to_string_lossy())
        .run(&test.command, args.as_slice(), file)
        .await
        .with_context(|| format!("Failed to run test command '{}'", test.command))?;
    tracing::info!(
        student = %student_id,
        spec = %file.spec().identifier(),
        status = ?outcome.status,
        score = file.score(),
        "Test finished"
    );
    Ok(outcome)
}

/// A member basename safe to use as a file name.
fn scratch_filename(file: &SubmissionFile) -> String {
    match file.filename() {
        "" | "." | ".." => file.spec().identifier().to_string(),
        name => name.to_string(),
    }
}

/// Values substituted into test command arguments.
#[derive(Debug, Clone)]
struct Placeholders {
    file: PathBuf,
    dir: PathBuf,
    filename: String,
    student: String,
}

impl Placeholders {
    fn substitute(&self, arg: &str) -> String {
        arg.replace("{file}", &self.file.to_string_lossy())
            .replace("{filename}", &self.filename)
            .replace("{dir}", &self.dir.to_string_lossy())
            .replace("{student}", &self.student)
    }
}
