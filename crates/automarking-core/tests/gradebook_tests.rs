//! End-to-end tests for the Blackboard data source.
//!
//! Builds gradebook exports on disk, loads them, marks the extracted
//! files, and checks the grade column written back.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use automarking_core::{BlackboardDataSource, GradeColumn, SubmissionSpec};
use common::{GradebookFixture, tar_gz_bytes, zip_bytes};

fn specs() -> Vec<SubmissionSpec> {
    vec![
        SubmissionSpec::new("task1", "Task 1", r"^Task1\.java$").unwrap(),
        SubmissionSpec::with_components("task2", "Task 2", &["^src$", r"^Task2\.java$"]).unwrap(),
    ]
}

fn load(fixture: &GradebookFixture) -> BlackboardDataSource {
    BlackboardDataSource::new(&fixture.gradebook, &fixture.grade_column, specs())
        .with_work_dir(&fixture.work_dir)
        .load()
        .expect("load gradebook")
}

#[test]
fn test_only_listed_students_are_loaded() {
    let fixture = GradebookFixture::new(&["12345678"]).with_gradebook(&[
        (
            "Lab 1_12345678_attempt_2019-01-01.zip",
            zip_bytes(&[("Task1.java", "class Task1 {}")]),
        ),
        (
            "Lab 1_99999999_attempt_2019-01-01.zip",
            zip_bytes(&[("Task1.java", "class Task1 {}")]),
        ),
        ("Lab 1_12345678_attempt_2019-01-01.txt", b"Name: Doe".to_vec()),
    ]);

    let source = load(&fixture);

    assert_eq!(source.submissions().len(), 1);
    let submission = &source.submissions()[0];
    assert_eq!(submission.student_id(), "12345678");
    assert_eq!(submission.archive(), fixture.work_dir.join("12345678.zip"));
    assert!(submission.archive().exists());
    assert_eq!(submission.files().len(), 1);
    assert_eq!(submission.files()[0].text(), "class Task1 {}");
}

#[test]
fn test_tar_gz_submission_with_nested_spec() {
    let fixture = GradebookFixture::new(&["123456789"]).with_gradebook(&[(
        "Lab 1_123456789_attempt_2019-01-01.tar.gz",
        tar_gz_bytes(&[
            ("src/Task2.java", "class Task2 {}"),
            ("other/src/Task2.java", "ignored"),
            ("Task1.java", "class Task1 {}"),
        ]),
    )]);

    let source = load(&fixture);

    let submission = source.submission("123456789").expect("submission");
    let ids: Vec<_> = submission
        .files()
        .iter()
        .map(|f| (f.spec().identifier(), f.path()))
        .collect();
    assert_eq!(ids, vec![("task1", "Task1.java"), ("task2", "src/Task2.java")]);
    assert!(fixture.work_dir.join("123456789.tar.gz").exists());
}

#[test]
fn test_unknown_and_corrupt_submissions() {
    let fixture = GradebookFixture::new(&["12345678", "87654321"]).with_gradebook(&[
        ("Lab 1_12345678_attempt.7z", b"7z".to_vec()),
        ("Lab 1_87654321_attempt.zip", b"not a zip".to_vec()),
    ]);

    let source = load(&fixture);

    assert_eq!(source.submissions().len(), 1);
    assert_eq!(source.submissions()[0].student_id(), "87654321");
    assert!(source.submissions()[0].files().is_empty());
}

#[test]
fn test_write_grades_round_trip() {
    let fixture = GradebookFixture::new(&["12345678", "87654321"]).with_gradebook(&[(
        "Lab 1_12345678_attempt.zip",
        zip_bytes(&[("Task1.java", "x"), ("src/Task2.java", "y")]),
    )]);

    let mut source = load(&fixture);
    for file in source.submissions_mut()[0].files_mut() {
        file.set_score(2.0);
        file.add_feedback(format!("{} compiled", file.filename()));
    }
    source.finish().expect("write grades");

    let bytes = std::fs::read(&fixture.grade_column).unwrap();
    assert!(bytes.starts_with(b"\xef\xbb\xbf"));
    let column = GradeColumn::from_bytes(&bytes).unwrap();
    assert_eq!(column.headers()[4], "Feedback to User");
    assert_eq!(column.value(0, "Lab 1 [Total Pts: 4 Score] |42"), Some("4"));
    assert_eq!(
        column.value(0, "Feedback to User"),
        Some("######\nTask 1\n######\nTask1.java compiled\n######\nTask 2\n######\nTask2.java compiled")
    );
    assert_eq!(column.value(1, "Lab 1 [Total Pts: 4 Score] |42"), Some("0"));
    assert_eq!(column.value(1, "Feedback to User"), Some(""));
    assert_eq!(column.value(1, "First Name"), Some("87654321"));
}

#[test]
fn test_missing_gradebook_is_error() {
    let fixture = GradebookFixture::new(&["12345678"]);
    std::fs::remove_file(&fixture.gradebook).unwrap();

    let result = BlackboardDataSource::new(&fixture.gradebook, &fixture.grade_column, specs())
        .with_work_dir(&fixture.work_dir)
        .load();
    assert!(result.is_err());
}

#[test]
fn test_last_attempt_decides_grade() {
    let fixture = GradebookFixture::new(&["12345678"]).with_gradebook(&[
        (
            "Lab 1_12345678_attempt_2019-01-01.zip",
            zip_bytes(&[("Task1.java", "first")]),
        ),
        (
            "Lab 1_12345678_attempt_2019-01-02.zip",
            zip_bytes(&[("Task1.java", "second"), ("src/Task2.java", "second")]),
        ),
    ]);

    let mut source = load(&fixture);
    assert_eq!(source.submissions().len(), 2);
    let archives: Vec<_> = source.submissions().iter().map(|s| s.archive()).collect();
    assert_eq!(
        archives,
        vec![
            fixture.work_dir.join("12345678.zip"),
            fixture.work_dir.join("12345678_2.zip"),
        ]
    );
    assert_eq!(source.submissions()[0].files()[0].text(), "first");

    for submission in source.submissions_mut() {
        for file in submission.files_mut() {
            let text = file.text().into_owned();
            file.set_score(1.0);
            file.add_feedback(format!("{} from {text}", file.filename()));
        }
    }
    let latest = source.submission("12345678").expect("submission");
    assert_eq!(latest.archive(), fixture.work_dir.join("12345678_2.zip"));
    assert_eq!(latest.score(), 2.0);
    source.finish().expect("write grades");

    let column = GradeColumn::read(&fixture.grade_column).unwrap();
    assert_eq!(column.value(0, "Lab 1 [Total Pts: 4 Score] |42"), Some("2"));
    assert_eq!(
        column.value(0, "Feedback to User"),
        Some("######\nTask 1\n######\nTask1.java from second\n######\nTask 2\n######\nTask2.java from second")
    );
}
