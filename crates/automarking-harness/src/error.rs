//! Error types for the automarking harness.

/// Errors that can occur while preparing or running tests.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error from automarking-core
    #[error("Core error: {0}")]
    Core(#[from] automarking_core::Error),

    /// I/O error while talking to a test process
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The test command could not be started
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        /// Program that failed to start
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Convenience `Result` type alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a spawn error for `command`.
    pub fn spawn<S: Into<String>>(command: S, source: std::io::Error) -> Self {
        Error::Spawn {
            command: command.into(),
            source,
        }
    }
}
