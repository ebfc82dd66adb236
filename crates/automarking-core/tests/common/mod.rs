//! Fixture builders for Blackboard gradebook exports.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// A temporary directory holding a gradebook zip and grade column CSV.
pub struct GradebookFixture {
    /// Keeps the directory alive for the duration of the test
    pub dir: TempDir,
    /// Path of the gradebook zip
    pub gradebook: PathBuf,
    /// Path of the grade column CSV
    pub grade_column: PathBuf,
    /// Work directory for extracted submissions
    pub work_dir: PathBuf,
}

impl GradebookFixture {
    /// Creates a fixture for the given students with an empty gradebook.
    pub fn new(students: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let gradebook = dir.path().join("gradebook.zip");
        let grade_column = dir.path().join("grades.csv");
        let work_dir = dir.path().join("tmp");

        let mut csv = String::from(
            "\u{feff}Last Name,First Name,Student ID,Lab 1 [Total Pts: 4 Score] |42,Feedback to Learner\r\n",
        );
        for student in students {
            csv.push_str(&format!("Student,{student},{student},,exported feedback\r\n"));
        }
        std::fs::write(&grade_column, csv).unwrap();
        zip_bytes_to(&gradebook, &[]);

        Self {
            dir,
            gradebook,
            grade_column,
            work_dir,
        }
    }

    /// Replaces the gradebook with the given members.
    pub fn with_gradebook(self, members: &[(&str, Vec<u8>)]) -> Self {
        zip_bytes_to(&self.gradebook, members);
        self
    }
}

/// Builds an in-memory zip archive.
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Builds an in-memory gzip-compressed tar archive.
pub fn tar_gz_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, body) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, body.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn zip_bytes_to(path: &Path, members: &[(&str, Vec<u8>)]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, body) in members {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap();
}
