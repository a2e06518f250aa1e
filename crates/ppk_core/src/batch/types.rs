//! Batch state, events and results.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::matching::SkipReason;
use crate::rtkconf::BaseCoordinates;
use crate::stats::StatisticsRow;

/// Batch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchState {
    Idle,
    Validating,
    Running,
    Completed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Idle => "idle",
            BatchState::Validating => "validating",
            BatchState::Running => "running",
            BatchState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Where the base station position comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoordinateMode {
    /// Leave the configuration's positions untouched.
    #[default]
    FromConfig,
    /// One position for every rover, applied once before the loop.
    Manual(BaseCoordinates),
    /// Per-rover position from the `.sum` file sharing the rover date.
    Auto,
}

impl fmt::Display for CoordinateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateMode::FromConfig => f.write_str("from configuration"),
            CoordinateMode::Manual(c) => write!(
                f,
                "manual (lat {}, lon {}, h {})",
                c.latitude, c.longitude, c.height
            ),
            CoordinateMode::Auto => f.write_str("auto (.sum files)"),
        }
    }
}

/// How the batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BatchOutcome {
    /// Every rover was visited (some may have been skipped or failed).
    Completed,
    /// A configuration error stopped the remaining rovers.
    Aborted(String),
    /// Stopped at a rover boundary on request.
    Cancelled,
}

impl BatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BatchOutcome::Completed)
    }
}

/// Final tally of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub name: String,
    /// Rovers in the request.
    pub total: usize,
    /// Rovers visited, whatever their outcome.
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcome: BatchOutcome,
    pub statistics: Vec<StatisticsRow>,
    pub log_path: Option<PathBuf>,
}

impl BatchSummary {
    pub fn new(name: impl Into<String>, total: usize) -> Self {
        Self {
            name: name.into(),
            total,
            processed: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            outcome: BatchOutcome::Completed,
            statistics: Vec::new(),
            log_path: None,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} rovers processed: {} succeeded, {} skipped, {} failed",
            self.processed, self.total, self.succeeded, self.skipped, self.failed
        )?;
        match &self.outcome {
            BatchOutcome::Completed => Ok(()),
            BatchOutcome::Aborted(reason) => write!(f, " (aborted: {})", reason),
            BatchOutcome::Cancelled => f.write_str(" (cancelled)"),
        }
    }
}

/// Message from the batch worker to the front end.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    StateChanged(BatchState),
    /// One formatted log line.
    Log(String),
    Progress {
        processed: usize,
        total: usize,
    },
    RoverSkipped {
        rover: String,
        reason: SkipReason,
    },
    RoverFailed {
        rover: String,
        message: String,
    },
    Statistics(StatisticsRow),
    /// Always the last event of a batch.
    Completed(BatchSummary),
}

/// Captured result of one external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_display() {
        let mut summary = BatchSummary::new("batch", 3);
        summary.processed = 3;
        summary.succeeded = 1;
        summary.skipped = 2;
        assert_eq!(
            summary.to_string(),
            "3/3 rovers processed: 1 succeeded, 2 skipped, 0 failed"
        );

        summary.outcome = BatchOutcome::Aborted("disk full".into());
        assert!(summary.to_string().ends_with("(aborted: disk full)"));
    }

    #[test]
    fn only_exit_zero_is_success() {
        let mut output = ProcessOutput::default();
        assert!(!output.success());
        output.exit_code = Some(0);
        assert!(output.success());
    }
}
