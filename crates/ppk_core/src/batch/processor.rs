//! External post-processing step.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::errors::{BatchError, BatchResult};
use super::types::ProcessOutput;

/// Paths for one external invocation.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub config: &'a Path,
    pub output: &'a Path,
    pub rover: &'a Path,
    pub base: &'a Path,
    pub nav: &'a Path,
}

impl Invocation<'_> {
    /// `-k <config> -o <output> <rover> <base> <nav>`
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "-k".into(),
            self.config.into(),
            "-o".into(),
            self.output.into(),
            self.rover.into(),
            self.base.into(),
            self.nav.into(),
        ]
    }
}

/// Turns one matched triple into a solution file.
///
/// Implementations block until the solution is written. A nonzero exit is
/// reported through [`ProcessOutput`], not as an error; `Err` means the
/// process could not be run at all.
pub trait SolutionProcessor: Send {
    /// Program path, used for logging.
    fn program(&self) -> &Path;

    fn process(&self, invocation: &Invocation<'_>) -> BatchResult<ProcessOutput>;

    /// Short tool name for log headers.
    fn name(&self) -> String {
        self.program()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "processor".to_string())
    }

    /// Shell-style rendering of the invocation.
    fn command_line(&self, invocation: &Invocation<'_>) -> String {
        let mut parts = vec![self.program().display().to_string()];
        parts.extend(
            invocation
                .args()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

/// RTKLIB `rnx2rtkp` (or a compatible executable).
#[derive(Debug, Clone)]
pub struct RtkPostProcessor {
    executable: PathBuf,
}

impl RtkPostProcessor {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl SolutionProcessor for RtkPostProcessor {
    fn program(&self) -> &Path {
        &self.executable
    }

    fn process(&self, invocation: &Invocation<'_>) -> BatchResult<ProcessOutput> {
        tracing::debug!("Running: {}", self.command_line(invocation));

        let output = Command::new(&self.executable)
            .args(invocation.args())
            .output()
            .map_err(|e| BatchError::launch(self.name(), e))?;

        Ok(ProcessOutput::from(output))
    }
}

/// Convert a nonzero exit into [`BatchError::CommandFailed`].
pub fn check_exit(tool: &str, output: &ProcessOutput) -> BatchResult<()> {
    if output.success() {
        return Ok(());
    }
    Err(BatchError::command_failed(
        tool,
        output.exit_code.unwrap_or(-1),
        output.stderr.trim_end(),
    ))
}
