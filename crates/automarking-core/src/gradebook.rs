//! Blackboard gradebook import and grade column export.
//!
//! Blackboard exports two files per assignment: a gradebook zip holding
//! every student attempt, and a grade column CSV with one row per student.
//! [`BlackboardDataSource`] reads both, extracts the submissions of every
//! student listed in the CSV, and writes scores and feedback back into
//! the CSV once marking is done.
//!
//! ```no_run
//! use automarking_core::{BlackboardDataSource, SubmissionSpec};
//!
//! # fn main() -> automarking_core::Result<()> {
//! let specs = vec![SubmissionSpec::new("task1", "Task 1", r"^Task1\.java$")?];
//! let mut source = BlackboardDataSource::new("gradebook.zip", "grades.csv", specs)
//!     .with_work_dir("tmp")
//!     .load()?;
//! for submission in source.submissions_mut() {
//!     for file in submission.files_mut() {
//!         file.set_score(1.0);
//!         file.add_feedback("Compiles");
//!     }
//! }
//! source.finish()?;
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::archive::ArchiveFormat;
use crate::error::{Error, Result};
use crate::spec::{SubmissionSpec, basename};
use crate::submission::Submission;

/// Column holding the student number.
pub const STUDENT_ID_COLUMN: &str = "Student ID";
/// Fragment identifying the score column header.
pub const SCORE_COLUMN_MARKER: &str = "Total Pts:";
/// Feedback column header as exported by Blackboard.
pub const LEARNER_FEEDBACK_COLUMN: &str = "Feedback to Learner";
/// Feedback column header Blackboard expects on import.
pub const USER_FEEDBACK_COLUMN: &str = "Feedback to User";

const BOM: &[u8] = b"\xef\xbb\xbf";

#[allow(clippy::unwrap_used)]
static STUDENT_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{8,9}").unwrap());

/// Extract the first 8 or 9 digit student number from a gradebook member name.
///
/// ```
/// use automarking_core::gradebook::student_number;
///
/// assert_eq!(student_number("Lab 1_123456789_attempt_2019.zip"), Some("123456789"));
/// assert_eq!(student_number("Lab 1_1234567_attempt.zip"), None);
/// ```
pub fn student_number(name: &str) -> Option<&str> {
    STUDENT_NUMBER.find(name).map(|m| m.as_str())
}

/// Read the student numbers listed in a grade column CSV.
pub fn read_student_ids(path: &Path) -> Result<Vec<String>> {
    GradeColumn::read(path)?.student_ids()
}

/// An in-memory grade column CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeColumn {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl GradeColumn {
    /// Read a grade column CSV, stripping a leading UTF-8 byte order mark.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a grade column CSV from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;
        Ok(Self { headers, rows })
    }

    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of the column with exactly this header.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of `column` in `row`, if the row is long enough.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Index of the last column whose header contains `Total Pts:`.
    pub fn score_column(&self) -> Result<usize> {
        self.headers
            .iter()
            .rposition(|h| h.contains(SCORE_COLUMN_MARKER))
            .ok_or_else(|| Error::missing_column(SCORE_COLUMN_MARKER))
    }

    /// All values of the `Student ID` column.
    pub fn student_ids(&self) -> Result<Vec<String>> {
        let index = self
            .column(STUDENT_ID_COLUMN)
            .ok_or_else(|| Error::missing_column(STUDENT_ID_COLUMN))?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect())
    }

    /// Record scores and feedback for every student row.
    ///
    /// Students without a submission score 0 with empty feedback. Feedback
    /// exported in `Feedback to Learner` is discarded and the column is
    /// renamed to `Feedback to User`.
    pub fn record_grades(&mut self, submissions: &HashMap<&str, &Submission>) -> Result<()> {
        let student_index = self
            .column(STUDENT_ID_COLUMN)
            .ok_or_else(|| Error::missing_column(STUDENT_ID_COLUMN))?;
        let score_index = self.score_column()?;
        let feedback_index = self.feedback_column();
        let width = self.headers.len();

        for row in &mut self.rows {
            row.resize(width, String::new());
            let (score, feedback) = match submissions.get(row[student_index].as_str()) {
                Some(submission) => (submission.score(), submission.feedback_text()),
                None => (0.0, String::new()),
            };
            row[score_index] = format_score(score);
            row[feedback_index] = feedback;
        }
        Ok(())
    }

    /// Serialise with a UTF-8 byte order mark and CRLF line endings.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::CRLF)
            .from_writer(BOM.to_vec());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::Io(io::Error::other(e.to_string())))
    }

    /// Write the grade column to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes()?).map_err(|e| Error::io_with_path(e, path))
    }

    fn feedback_column(&mut self) -> usize {
        if let Some(index) = self.column(LEARNER_FEEDBACK_COLUMN) {
            self.headers[index] = USER_FEEDBACK_COLUMN.to_string();
            index
        } else if let Some(index) = self.column(USER_FEEDBACK_COLUMN) {
            index
        } else {
            self.headers.push(USER_FEEDBACK_COLUMN.to_string());
            self.headers.len() - 1
        }
    }
}

fn format_score(score: f64) -> String {
    format!("{score}")
}

/// Source of student submissions backed by a Blackboard gradebook export.
#[derive(Debug)]
pub struct BlackboardDataSource {
    gradebook: PathBuf,
    grade_column: PathBuf,
    specs: Vec<Arc<SubmissionSpec>>,
    work_dir: PathBuf,
    submissions: Vec<Submission>,
}

impl BlackboardDataSource {
    /// Default directory submission archives are copied into.
    pub const DEFAULT_WORK_DIR: &'static str = "tmp";

    /// Create a data source; nothing is read until [`load`](Self::load).
    pub fn new(
        gradebook: impl Into<PathBuf>,
        grade_column: impl Into<PathBuf>,
        specs: impl IntoIterator<Item = SubmissionSpec>,
    ) -> Self {
        Self {
            gradebook: gradebook.into(),
            grade_column: grade_column.into(),
            specs: specs.into_iter().map(Arc::new).collect(),
            work_dir: PathBuf::from(Self::DEFAULT_WORK_DIR),
            submissions: Vec::new(),
        }
    }

    /// Create a data source and load it with the default work directory.
    pub fn open(
        gradebook: impl Into<PathBuf>,
        grade_column: impl Into<PathBuf>,
        specs: impl IntoIterator<Item = SubmissionSpec>,
    ) -> Result<Self> {
        Self::new(gradebook, grade_column, specs).load()
    }

    /// Set the directory submission archives are copied into.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Extract the submissions of every student listed in the grade column.
    pub fn load(mut self) -> Result<Self> {
        let students: HashSet<String> = read_student_ids(&self.grade_column)?.into_iter().collect();
        tracing::info!(
            students = students.len(),
            gradebook = %self.gradebook.display(),
            "Loading gradebook"
        );
        fs::create_dir_all(&self.work_dir).map_err(|e| Error::io_with_path(e, &self.work_dir))?;

        let file = File::open(&self.gradebook).map_err(|e| Error::io_with_path(e, &self.gradebook))?;
        let mut gradebook = zip::ZipArchive::new(BufReader::new(file))?;
        let mut submissions = Vec::new();
        let mut attempts: HashMap<String, usize> = HashMap::new();
        for index in 0..gradebook.len() {
            let mut entry = gradebook.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let Some(student) = student_number(&name).filter(|s| students.contains(*s)) else {
                continue;
            };
            match ArchiveFormat::detect(&name) {
                Some(format) => {
                    let attempt = attempts.entry(student.to_string()).or_default();
                    *attempt += 1;
                    let target = self.work_dir.join(copy_name(student, *attempt, &name));
                    copy_entry(&mut entry, &target)?;
                    submissions.push(Submission::extract(student, target, format, &self.specs)?);
                }
                None if name.to_lowercase().ends_with(".txt") => {}
                None => tracing::warn!(member = %name, "Unknown submission"),
            }
        }
        tracing::info!(submissions = submissions.len(), "Gradebook loaded");
        self.submissions = submissions;
        Ok(self)
    }

    /// Path of the gradebook archive.
    pub fn gradebook(&self) -> &Path {
        &self.gradebook
    }

    /// Path of the grade column CSV.
    pub fn grade_column(&self) -> &Path {
        &self.grade_column
    }

    /// Directory submission archives are copied into.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// The submission specs.
    pub fn specs(&self) -> &[Arc<SubmissionSpec>] {
        &self.specs
    }

    /// Extracted submissions.
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Extracted submissions, for marking.
    pub fn submissions_mut(&mut self) -> &mut [Submission] {
        &mut self.submissions
    }

    /// Look up the submission of a student; the last one wins.
    pub fn submission(&self, student_id: &str) -> Option<&Submission> {
        self.submissions
            .iter()
            .rev()
            .find(|s| s.student_id() == student_id)
    }

    /// Write scores and feedback into the grade column CSV.
    pub fn write_grades(&self) -> Result<()> {
        let by_student: HashMap<&str, &Submission> = self
            .submissions
            .iter()
            .map(|s| (s.student_id(), s))
            .collect();
        let mut column = GradeColumn::read(&self.grade_column)?;
        column.record_grades(&by_student)?;
        column.write(&self.grade_column)?;
        tracing::info!(
            grade_column = %self.grade_column.display(),
            rows = column.rows().len(),
            "Grades written"
        );
        Ok(())
    }

    /// Write the grades and release the data source.
    pub fn finish(self) -> Result<()> {
        self.write_grades()
    }
}

/// `<student><suffix>` for the first attempt, `<student>_<attempt><suffix>` after that.
fn copy_name(student: &str, attempt: usize, member: &str) -> String {
    let suffix = copy_suffix(member);
    if attempt <= 1 {
        format!("{student}{suffix}")
    } else {
        format!("{student}_{attempt}{suffix}")
    }
}

/// The member's basename from its first `.` onwards.
fn copy_suffix(name: &str) -> &str {
    let base = basename(name);
    base.find('.').map_or("", |index| &base[index..])
}

fn copy_entry(entry: &mut impl Read, target: &Path) -> Result<()> {
    let mut out = File::create(target).map_err(|e| Error::io_with_path(e, target))?;
    io::copy(entry, &mut out).map_err(|e| Error::io_with_path(e, target))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::submission::SubmissionFile;

    const CSV: &str = "\u{feff}Last Name,Student ID,Lab 1 [Total Pts: 10 Score] |123,Feedback to Learner\r\n\
                       Doe,12345678,,old feedback\r\n\
                       Roe,87654321,,\r\n";

    #[test]
    fn test_student_number() {
        assert_eq!(student_number("Lab_12345678_attempt.zip"), Some("12345678"));
        assert_eq!(student_number("no number"), None);
        assert_eq!(student_number("x_1234567890_y"), Some("123456789"));
    }

    #[test]
    fn test_read_strips_bom() {
        let column = GradeColumn::from_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(column.headers()[0], "Last Name");
        assert_eq!(column.student_ids().unwrap(), vec!["12345678", "87654321"]);
        assert_eq!(column.value(0, "Feedback to Learner"), Some("old feedback"));
    }

    #[test]
    fn test_missing_student_column() {
        let column = GradeColumn::from_bytes(b"Name,Score\r\nx,1\r\n").unwrap();
        let err = column.student_ids().unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column } if column == "Student ID"));
    }

    #[test]
    fn test_missing_score_column() {
        let mut column = GradeColumn::from_bytes(b"Student ID\r\n12345678\r\n").unwrap();
        let err = column.record_grades(&HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column } if column == "Total Pts:"));
    }

    #[test]
    fn test_record_grades() {
        let mut column = GradeColumn::from_bytes(CSV.as_bytes()).unwrap();
        let spec = Arc::new(SubmissionSpec::new("t", "T", ".").unwrap());
        let mut file = SubmissionFile::new(spec, "a.py", vec![]);
        file.set_score(2.0);
        file.add_feedback("passed");
        let mut submission = Submission::new("12345678", "tmp/12345678.zip");
        submission.push_file(file);
        let by_student = HashMap::from([("12345678", &submission)]);

        column.record_grades(&by_student).unwrap();

        assert_eq!(column.headers()[3], "Feedback to User");
        assert_eq!(column.value(0, "Lab 1 [Total Pts: 10 Score] |123"), Some("2"));
        assert_eq!(column.value(0, "Feedback to User"), Some("#\nT\n#\npassed"));
        assert_eq!(column.value(1, "Lab 1 [Total Pts: 10 Score] |123"), Some("0"));
        assert_eq!(column.value(1, "Feedback to User"), Some(""));
    }

    #[test]
    fn test_feedback_column_appended_when_absent() {
        let mut column =
            GradeColumn::from_bytes(b"Student ID,Total Pts: 5\r\n12345678,\r\n").unwrap();
        column.record_grades(&HashMap::new()).unwrap();
        assert_eq!(column.headers(), ["Student ID", "Total Pts: 5", "Feedback to User"]);
        assert_eq!(column.rows()[0], ["12345678", "0", ""]);
    }

    #[test]
    fn test_to_bytes_writes_bom_and_crlf() {
        let column = GradeColumn::from_bytes(b"Student ID\n12345678\n").unwrap();
        let bytes = column.to_bytes().unwrap();
        assert!(bytes.starts_with(BOM));
        assert_eq!(&bytes[BOM.len()..], b"Student ID\r\n12345678\r\n");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.0), "0");
        assert_eq!(format_score(4.0), "4");
        assert_eq!(format_score(2.5), "2.5");
    }

    #[test]
    fn test_score_column_is_last_match() {
        let mut column = GradeColumn::from_bytes(
            b"Student ID,Lab 0 [Total Pts: 5] |1,Lab 1 [Total Pts: 10] |2,Feedback to User\r\n\
              12345678,3,,\r\n",
        )
        .unwrap();
        assert_eq!(column.score_column().unwrap(), 2);

        column.record_grades(&HashMap::new()).unwrap();
        assert_eq!(column.rows()[0], ["12345678", "3", "0", ""]);
    }

    #[test]
    fn test_copy_name() {
        assert_eq!(copy_name("12345678", 1, "Lab_12345678_a.zip"), "12345678.zip");
        assert_eq!(copy_name("12345678", 2, "Lab_12345678_b.zip"), "12345678_2.zip");
    }

    #[test]
    fn test_copy_suffix() {
        assert_eq!(copy_suffix("Lab_12345678_attempt_x.tar.gz"), ".tar.gz");
        assert_eq!(copy_suffix("dir.v2/Lab_12345678.zip"), ".zip");
        assert_eq!(copy_suffix("noext"), "");
    }
}
