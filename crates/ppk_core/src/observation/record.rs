//! Observation record types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::parser::parse_date_time;

/// Role of a file in a PPK triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    /// Moving receiver log.
    Rover,
    /// Stationary reference receiver log.
    Base,
    /// Satellite ephemeris.
    Navigation,
}

impl FileRole {
    /// Get display string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rover => "rover",
            Self::Base => "base",
            Self::Navigation => "navigation",
        }
    }

    /// Whether the second-line `YYYYMMDD HHMMSS` stamp is accepted.
    ///
    /// Navigation files follow the base rule set.
    pub fn uses_second_line_stamp(&self) -> bool {
        matches!(self, Self::Base | Self::Navigation)
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the observation layer.
///
/// Scanning never fails (unreadable files yield an empty stamp); only user
/// input naming a role can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObservationError {
    #[error("Unknown file role: {0} (expected rover, base or nav)")]
    UnknownRole(String),
}

/// Result type for observation operations.
pub type ObservationResult<T> = Result<T, ObservationError>;

impl FromStr for FileRole {
    type Err = ObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rover" => Ok(Self::Rover),
            "base" => Ok(Self::Base),
            "nav" | "navigation" => Ok(Self::Navigation),
            other => Err(ObservationError::UnknownRole(other.to_string())),
        }
    }
}

/// An imported observation file and the stamp found in it.
///
/// Built once at import time and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservationRecord {
    path: PathBuf,
    name: String,
    role: FileRole,
    date: Option<String>,
    time: Option<String>,
}

impl ObservationRecord {
    /// Scan `path` and build its record.
    pub fn from_path(path: impl Into<PathBuf>, role: FileRole) -> Self {
        let path = path.into();
        let (date, time) = parse_date_time(&path, role);
        Self::new(path, role, date, time)
    }

    /// Build a record from an already known stamp.
    pub fn new(
        path: impl Into<PathBuf>,
        role: FileRole,
        date: Option<String>,
        time: Option<String>,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            role,
            date,
            time,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem, used to name the output solution.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name including extension.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn role(&self) -> FileRole {
        self.role
    }

    /// Acquisition date, `YYYYMMDD`.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Acquisition time, `HHMMSS`.
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// List label: `name.obs (Date: 20240615, Time: 101500)`.
    pub fn display_label(&self) -> String {
        format!(
            "{} (Date: {}, Time: {})",
            self.file_name(),
            self.date().unwrap_or("Unknown"),
            self.time().unwrap_or("Unknown")
        )
    }
}
