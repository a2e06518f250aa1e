//! Project files (`.ppk`).
//!
//! A project is a pretty-printed JSON document holding everything needed to
//! rerun a batch: the executable, the configuration, the imported files, the
//! configuration values entered by the user, the base position and the
//! results of the last run.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::BatchSession;
use crate::observation::FileRole;
use crate::rtkconf::{BaseCoordinates, ConfigOverrides};
use crate::stats::StatisticsRow;

/// Project file extension.
pub const PROJECT_EXTENSION: &str = "ppk";

/// Errors from project persistence.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Failed to {operation} project file {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid project file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ProjectError {
    fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Base position as stored in a project. Empty strings mean "not entered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectCoordinates {
    pub latitude: String,
    pub longitude: String,
    pub height: String,
}

impl ProjectCoordinates {
    pub fn is_empty(&self) -> bool {
        self.latitude.trim().is_empty()
            && self.longitude.trim().is_empty()
            && self.height.trim().is_empty()
    }
}

impl From<&BaseCoordinates> for ProjectCoordinates {
    fn from(coords: &BaseCoordinates) -> Self {
        Self {
            latitude: coords.latitude.clone(),
            longitude: coords.longitude.clone(),
            height: coords.height.clone(),
        }
    }
}

/// A saved batch setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub executable_path: String,
    pub config_path: String,
    pub rover_files: Vec<PathBuf>,
    pub base_files: Vec<PathBuf>,
    pub nav_files: Vec<PathBuf>,
    pub sum_files: Vec<PathBuf>,
    pub config_settings: BTreeMap<String, String>,
    pub base_coordinates: ProjectCoordinates,
    /// Log text of the last run.
    pub logs: String,
    pub statistics: Vec<StatisticsRow>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the files of `session` together with the results of a run.
    pub fn from_session(
        session: &BatchSession,
        logs: impl Into<String>,
        statistics: Vec<StatisticsRow>,
    ) -> Self {
        Self {
            rover_files: session.rovers.paths(),
            base_files: session.bases.paths(),
            nav_files: session.navs.paths(),
            sum_files: session.sum_files.clone(),
            logs: logs.into(),
            statistics,
            ..Self::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> ProjectResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ProjectError::io("read", path, e))?;
        let project: Self =
            serde_json::from_str(&content).map_err(|e| ProjectError::json(path, e))?;
        tracing::debug!("Loaded project from {}", path.display());
        Ok(project)
    }

    /// Write the project atomically (`<path>.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> ProjectResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ProjectError::io("create directory for", path, e))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ProjectError::json(path, e))?;

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        fs::write(&temp_path, json).map_err(|e| ProjectError::io("write", &temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| ProjectError::io("replace", path, e))?;

        tracing::info!("Project saved to {}", path.display());
        Ok(())
    }

    /// Rebuild a session, re-scanning every listed file.
    ///
    /// Files that no longer exist are reported and left out.
    pub fn into_session(&self) -> BatchSession {
        let mut session = BatchSession::new();
        for (role, files) in [
            (FileRole::Rover, &self.rover_files),
            (FileRole::Base, &self.base_files),
            (FileRole::Navigation, &self.nav_files),
        ] {
            session.import(role, existing_files(files, role.as_str()));
        }
        session.import_sum_files(existing_files(&self.sum_files, "sum"));
        session
    }

    /// Recognized configuration values. Unknown keys are dropped.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides::from_pairs(
            self.config_settings
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    pub fn set_overrides(&mut self, overrides: &ConfigOverrides) {
        self.config_settings = overrides
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
    }

    /// The stored base position, if all three values are present and numeric.
    pub fn base_coordinates(&self) -> Option<BaseCoordinates> {
        let coords = &self.base_coordinates;
        if coords.latitude.trim().is_empty()
            || coords.longitude.trim().is_empty()
            || coords.height.trim().is_empty()
        {
            return None;
        }
        match BaseCoordinates::new(&coords.latitude, &coords.longitude, &coords.height) {
            Ok(coords) => Some(coords),
            Err(e) => {
                tracing::warn!("Ignoring stored base coordinates: {}", e);
                None
            }
        }
    }

    pub fn set_base_coordinates(&mut self, coords: &BaseCoordinates) {
        self.base_coordinates = ProjectCoordinates::from(coords);
    }

    pub fn executable(&self) -> Option<PathBuf> {
        non_empty_path(&self.executable_path)
    }

    pub fn config(&self) -> Option<PathBuf> {
        non_empty_path(&self.config_path)
    }
}

fn existing_files<'a>(files: &'a [PathBuf], kind: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    files.iter().filter_map(move |path| {
        if path.is_file() {
            Some(path.clone())
        } else {
            tracing::warn!("{} file not found, skipping: {}", kind, path.display());
            None
        }
    })
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("survey.ppk");

        let mut project = Project::new();
        project.executable_path = "/opt/rtklib/rnx2rtkp".to_string();
        project
            .config_settings
            .insert("pos1-antheight".to_string(), "1.800".to_string());
        project.statistics.push(StatisticsRow {
            file: "rover.pos".to_string(),
            q1: 95.0,
            q2: 5.0,
            q3: 0.0,
            q4: 0.0,
            q5: 0.0,
        });
        project.save(&path).unwrap();

        assert!(!dir.path().join("survey.ppk.tmp").exists());
        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn partial_document_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.ppk");
        fs::write(
            &path,
            r#"{"config_path": "ppk.conf", "statistics": [
                {"file": "a.pos", "status": "ok"},
                {"file": "b.pos", "status": "97.25", "processing_time": "2.75"}
            ]}"#,
        )
        .unwrap();

        let project = Project::load(&path).unwrap();
        assert_eq!(project.config(), Some(PathBuf::from("ppk.conf")));
        assert!(project.executable().is_none());
        assert!(project.rover_files.is_empty());
        assert_eq!(project.statistics[0].q1, 0.0);
        assert_eq!(project.statistics[1].q1, 97.25);
        assert_eq!(project.statistics[1].q2, 2.75);
        assert!(project.base_coordinates.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.ppk");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Project::load(&path), Err(ProjectError::Json { .. })));
    }

    #[test]
    fn missing_files_are_dropped() {
        let dir = tempdir().unwrap();
        let rover = dir.path().join("rover.obs");
        fs::write(&rover, "> 2024 06 15 10 00 00.0000000  0 8\n").unwrap();

        let mut project = Project::new();
        project.rover_files = vec![rover.clone(), dir.path().join("gone.obs")];
        project.sum_files = vec![dir.path().join("gone.sum")];

        let session = project.into_session();
        assert_eq!(session.rovers.paths(), vec![rover]);
        assert_eq!(session.rovers.records()[0].date(), Some("20240615"));
        assert!(session.sum_files.is_empty());
    }

    #[test]
    fn unknown_settings_are_ignored() {
        let mut project = Project::new();
        project
            .config_settings
            .insert("pos1-antheight".to_string(), "1.5".to_string());
        project
            .config_settings
            .insert("out-solformat".to_string(), "llh".to_string());

        let overrides = project.overrides();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides.get("pos1-antheight"), Some("1.5"));
    }

    #[test]
    fn base_coordinates_need_all_values() {
        let mut project = Project::new();
        project.base_coordinates.latitude = "48.1".to_string();
        assert!(project.base_coordinates().is_none());

        project.base_coordinates.longitude = "-1.6".to_string();
        project.base_coordinates.height = "72.3".to_string();
        let coords = project.base_coordinates().unwrap();
        assert_eq!(coords.longitude, "-1.6");
    }

    #[test]
    fn from_session_lists_files() {
        let mut session = BatchSession::new();
        session.import_sum_files(["base_20240615.sum"]);
        let project = Project::from_session(&session, "log text", Vec::new());
        assert_eq!(project.sum_files, vec![PathBuf::from("base_20240615.sum")]);
        assert_eq!(project.logs, "log text");
    }
}
