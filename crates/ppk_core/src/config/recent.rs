//! Small JSON state remembered between runs (`config.json`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::manager::{write_atomically, ConfigResult};

/// Default file name, next to the working directory.
pub const RECENT_STATE_FILE: &str = "config.json";

/// Last-used values that are not worth a settings section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentState {
    #[serde(default)]
    pub output_directory: String,
}

impl RecentState {
    /// Load the state, falling back to defaults if the file is missing or unreadable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write the state (temp file, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomically(path.as_ref(), &json)?;
        Ok(())
    }

    /// The remembered output directory, if any.
    pub fn output_directory(&self) -> Option<PathBuf> {
        (!self.output_directory.is_empty()).then(|| PathBuf::from(&self.output_directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_output_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECENT_STATE_FILE);

        let state = RecentState {
            output_directory: "/data/out".to_string(),
        };
        state.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"output_directory\": \"/data/out\""));
        assert_eq!(RecentState::load_or_default(&path), state);
    }

    #[test]
    fn missing_or_bad_file_gives_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECENT_STATE_FILE);
        assert_eq!(RecentState::load_or_default(&path).output_directory(), None);

        fs::write(&path, "not json").unwrap();
        assert_eq!(RecentState::load_or_default(&path), RecentState::default());
    }
}
