//! Running test commands against submission files.
//!
//! [`TestRunner::run`] spawns a test command, waits for it under a timeout,
//! and records the outcome on a [`SubmissionFile`]: a clean exit earns the
//! pass score, anything else the fail score, and the command's output is
//! attached as feedback.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use automarking_core::SubmissionFile;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::{Error, Result};

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Feedback recorded when a test exceeds its timeout.
pub const TIMEOUT_FEEDBACK: &str = "Test failed due to timeout";

/// How a test command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    /// Exited with status 0.
    Passed,
    /// Exited with a non-zero status, or was killed by a signal.
    Failed {
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
    },
    /// Killed after exceeding the timeout.
    TimedOut,
}

/// Captured result of a test command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// How the command ended.
    pub status: TestStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl TestOutcome {
    /// Returns `true` if the command exited with status 0.
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Runs test commands with a timeout and scores submission files.
#[derive(Debug, Clone)]
pub struct TestRunner {
    timeout: Duration,
    pass_score: f64,
    fail_score: f64,
    working_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            pass_score: 2.0,
            fail_score: 1.0,
            working_dir: None,
            env_vars: Vec::new(),
        }
    }
}

impl TestRunner {
    /// Default per-test timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a runner with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-test timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the score awarded when the test command succeeds.
    pub fn with_pass_score(mut self, score: f64) -> Self {
        self.pass_score = score;
        self
    }

    /// Set the score awarded when the test command fails or times out.
    pub fn with_fail_score(mut self, score: f64) -> Self {
        self.fail_score = score;
        self
    }

    /// Run test commands in `dir`.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for test commands.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// The per-test timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the test command and record score and feedback on `file`.
    ///
    /// The score is overwritten; feedback entries are appended.
    pub async fn run<S: AsRef<str>>(
        &self,
        command: &str,
        args: &[S],
        file: &mut SubmissionFile,
    ) -> Result<TestOutcome> {
        let outcome = self.execute(command, args).await?;
        self.record(&outcome, file);
        Ok(outcome)
    }

    /// Record an outcome on `file` without running anything.
    pub fn record(&self, outcome: &TestOutcome, file: &mut SubmissionFile) {
        match outcome.status {
            TestStatus::Passed => {
                file.set_score(self.pass_score);
                push_nonempty(file, &outcome.stdout);
            }
            TestStatus::Failed { .. } | TestStatus::TimedOut => {
                file.set_score(self.fail_score);
                push_nonempty(file, &outcome.stdout);
                push_nonempty(file, &outcome.stderr);
            }
        }
    }

    /// Spawn the command, capture its output, and enforce the timeout.
    pub async fn execute<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Result<TestOutcome> {
        let mut cmd = Command::new(command);
        cmd.args(args.iter().map(|arg| arg.as_ref()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(command, timeout_secs = self.timeout.as_secs(), "Running test");
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| Error::spawn(command, e))?;

        let mut stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        // Output is read under the same deadline: a background process
        // holding the pipes open must not outlive the timeout.
        let finished = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await?;
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match finished {
            Ok(Ok((status, stdout, stderr))) => {
                let status = if status.success() {
                    TestStatus::Passed
                } else {
                    TestStatus::Failed {
                        exit_code: status.code(),
                    }
                };
                tracing::debug!(command, ?status, duration_ms, "Test finished");
                Ok(TestOutcome {
                    status,
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                    duration_ms,
                })
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_elapsed) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(command, error = %e, "Failed to kill timed out test");
                }
                stdout_task.abort();
                stderr_task.abort();
                tracing::warn!(command, duration_ms, "Test timed out");
                Ok(TestOutcome {
                    status: TestStatus::TimedOut,
                    stdout: String::new(),
                    stderr: TIMEOUT_FEEDBACK.to_string(),
                    duration_ms,
                })
            }
        }
    }
}

fn push_nonempty(file: &mut SubmissionFile, text: &str) {
    if !text.is_empty() {
        file.add_feedback(text);
    }
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}
