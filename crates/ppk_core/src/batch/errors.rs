//! Error types for the batch runner.
//!
//! Only [`BatchError::Validation`] and [`BatchError::WorkerSpawn`] ever reach
//! the caller of [`super::BatchRunner::spawn`]. Everything else is raised per
//! rover inside the worker, logged, and reported as an event.

use std::io;

use thiserror::Error;

use crate::rtkconf::RtkConfError;
use crate::stats::StatsError;

/// Batch runner error.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The request is incomplete; nothing was started.
    #[error("Batch validation failed: {0}")]
    Validation(String),

    /// The background worker thread could not be started.
    #[error("Failed to start batch worker: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// The external processor could not be started.
    #[error("Failed to run {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The external processor exited with a nonzero status.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Reading or writing the working configuration failed.
    #[error(transparent)]
    Config(#[from] RtkConfError),

    /// Reading the solution file failed.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl BatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn launch(tool: impl Into<String>, source: io::Error) -> Self {
        Self::Launch {
            tool: tool.into(),
            source,
        }
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Whether this error stops the remaining rovers.
    pub fn aborts_batch(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_message_keeps_stderr() {
        let err = BatchError::command_failed("rnx2rtkp", 2, "no obs data");
        assert_eq!(
            err.to_string(),
            "rnx2rtkp failed with exit code 2: no obs data"
        );
        assert!(!err.aborts_batch());
    }

    #[test]
    fn config_errors_abort() {
        let err: BatchError = RtkConfError::UnknownKey("x".into()).into();
        assert!(err.aborts_batch());
    }
}
