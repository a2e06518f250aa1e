//! Working copy of the user's configuration.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::mutator::{apply_base_coordinates, apply_overrides, BaseCoordinates, ConfigOverrides};
use super::{RtkConfError, RtkConfResult};

/// A batch's private copy of the RTKLIB configuration.
///
/// The original file is only ever read (and copied to a `.bak` when asked).
/// Mutations accumulate in memory and reach disk on [`WorkingConfig::flush`].
#[derive(Debug)]
pub struct WorkingConfig {
    original: PathBuf,
    path: PathBuf,
    content: String,
    dirty: bool,
}

impl WorkingConfig {
    /// Back up `original` if `backup` is set and create the working copy in `work_dir`.
    pub fn prepare(
        original: impl AsRef<Path>,
        work_dir: impl AsRef<Path>,
        backup: bool,
    ) -> RtkConfResult<Self> {
        let original = original.as_ref();
        let work_dir = work_dir.as_ref();

        let content = fs::read_to_string(original).map_err(|e| RtkConfError::read(original, e))?;

        if backup {
            let backup_path = backup_path(original);
            fs::copy(original, &backup_path).map_err(|e| RtkConfError::write(&backup_path, e))?;
            tracing::debug!("Backed up configuration to {}", backup_path.display());
        }

        fs::create_dir_all(work_dir).map_err(|e| RtkConfError::write(work_dir, e))?;
        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        let mut path = work_dir.join(format!("{}.working.conf", stem));
        if path == original {
            path = work_dir.join(format!("{}.working.conf", path_stem(&path)));
        }

        let mut working = Self {
            original: original.to_path_buf(),
            path,
            content,
            dirty: true,
        };
        working.flush()?;
        Ok(working)
    }

    /// Path handed to the external processor.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        let updated = apply_overrides(&self.content, overrides);
        self.replace(updated);
    }

    pub fn set_base_coordinates(&mut self, coords: &BaseCoordinates) {
        let updated = apply_base_coordinates(&self.content, coords);
        self.replace(updated);
    }

    fn replace(&mut self, updated: String) {
        if updated != self.content {
            self.content = updated;
            self.dirty = true;
        }
    }

    /// Write pending changes (temp file, then rename).
    pub fn flush(&mut self) -> RtkConfResult<()> {
        if !self.dirty {
            return Ok(());
        }

        let temp_path = self.path.with_extension("conf.tmp");
        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| RtkConfError::write(&temp_path, e))?;
            file.write_all(self.content.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| RtkConfError::write(&temp_path, e))?;
        }
        fs::rename(&temp_path, &self.path).map_err(|e| RtkConfError::write(&self.path, e))?;

        self.dirty = false;
        Ok(())
    }
}

fn path_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `ppk.conf` → `ppk.conf.bak`.
pub fn backup_path(original: &Path) -> PathBuf {
    let mut name: OsString = original
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    original.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CONF: &str = "pos1-antheight     =0.0\nant2-pos1          =0  # (deg|m)\n";

    #[test]
    fn original_is_never_written() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("ppk.conf");
        fs::write(&original, CONF).unwrap();

        let mut working = WorkingConfig::prepare(&original, dir.path().join(".work"), true).unwrap();
        let mut overrides = ConfigOverrides::new();
        overrides.set("pos1-antheight", "1.800").unwrap();
        working.apply(&overrides);
        working.flush().unwrap();

        assert_eq!(fs::read_to_string(&original).unwrap(), CONF);
        assert_eq!(
            fs::read_to_string(dir.path().join("ppk.conf.bak")).unwrap(),
            CONF
        );
        let written = fs::read_to_string(working.path()).unwrap();
        assert!(written.starts_with("pos1-antheight     =1.800\n"));
        assert!(working.path().ends_with(".work/ppk.working.conf"));
        assert!(!working.path().with_extension("conf.tmp").exists());
    }

    #[test]
    fn no_backup_when_disabled() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("ppk.conf");
        fs::write(&original, CONF).unwrap();

        WorkingConfig::prepare(&original, dir.path(), false).unwrap();
        assert!(!dir.path().join("ppk.conf.bak").exists());
    }

    #[test]
    fn missing_original_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = WorkingConfig::prepare(dir.path().join("absent.conf"), dir.path(), true)
            .unwrap_err();
        assert!(matches!(err, RtkConfError::Read { .. }));
    }

    #[test]
    fn coordinates_reach_disk_on_flush() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("ppk.conf");
        fs::write(&original, CONF).unwrap();

        let mut working = WorkingConfig::prepare(&original, dir.path(), false).unwrap();
        working.set_base_coordinates(&BaseCoordinates::from_decimal(48.5, -1.25, 70.0));
        working.flush().unwrap();

        let written = fs::read_to_string(working.path()).unwrap();
        assert!(written.contains("ant2-pos1          =48.500000000  # (deg|m)"));
    }
}
