//! Settings file management.
//!
//! `.config/settings.toml` is owned by [`ConfigManager`]. Whole-file saves
//! regenerate every section with a heading comment; [`ConfigManager::update_section`]
//! swaps one table through `toml_edit` so hand edits elsewhere survive. All
//! writes go through a temp file and a rename.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table};

use super::settings::{ConfigSection, Settings};

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = ".config/settings.toml";

const FILE_HEADER: &str = "\
# PPK Batch Processor settings
# Rewritten when keys are missing; edits inside a section survive section updates.
";

/// Errors from the settings layer.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Settings file is not editable TOML: {0}")]
    Edit(#[from] toml_edit::TomlError),

    #[error("Could not encode state file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for settings operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file and its in-memory [`Settings`].
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Nothing is read until `load()` or `load_or_create()`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read an existing settings file.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.is_file() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }
        self.settings = toml::from_str(&fs::read_to_string(&self.config_path)?)?;
        Ok(())
    }

    /// Read the settings file, writing defaults first if there is none.
    ///
    /// A file with unknown sections or missing keys is written back complete.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            tracing::info!("Creating default settings at {}", self.config_path.display());
            self.settings = Settings::default();
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        if self.is_incomplete(&content.parse()?)? {
            tracing::debug!("Completing settings in {}", self.config_path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Create the work and logs folders.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [self.work_folder(), self.logs_folder()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    pub fn work_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.work_folder)
    }

    /// Unknown top-level entries, or a key of the current settings absent on disk.
    fn is_incomplete(&self, on_disk: &DocumentMut) -> ConfigResult<bool> {
        let known = ConfigSection::all().map(|s| s.table_name());
        if on_disk.iter().any(|(name, _)| !known.contains(&name)) {
            return Ok(true);
        }

        for section in ConfigSection::all() {
            let Some(existing) = on_disk
                .get(section.table_name())
                .and_then(Item::as_table_like)
            else {
                return Ok(true);
            };
            let complete = self.section_table(section)?;
            if complete.iter().any(|(key, _)| !existing.contains_key(key)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Rewrite the whole file from the in-memory settings.
    pub fn save(&self) -> ConfigResult<()> {
        let mut output = String::from(FILE_HEADER);

        for section in ConfigSection::all() {
            let heading = match section {
                ConfigSection::Paths => "Output, working copy and log directories",
                ConfigSection::Logging => "Console and batch log behavior",
                ConfigSection::Processing => "Matching and configuration handling",
                ConfigSection::Antenna => "Antenna models and vertical offsets (m)",
            };

            // A document per section keeps nested tables (antenna.types) qualified.
            let mut doc = DocumentMut::new();
            doc[section.table_name()] = Item::Table(self.section_table(section)?);
            output.push_str(&format!("\n# {}\n{}", heading, doc));
        }

        write_atomically(&self.config_path, &output)?;
        Ok(())
    }

    /// Replace one section on disk, keeping the rest of the file as it is.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = match fs::read_to_string(&self.config_path) {
            Ok(content) if !content.trim().is_empty() => content.parse::<DocumentMut>()?,
            Ok(_) => DocumentMut::new(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => DocumentMut::new(),
            Err(e) => return Err(e.into()),
        };

        doc[section.table_name()] = Item::Table(self.section_table(section)?);
        write_atomically(&self.config_path, &doc.to_string())?;
        tracing::debug!("Updated [{}] in {}", section.table_name(), self.config_path.display());
        Ok(())
    }

    fn section_table(&self, section: ConfigSection) -> ConfigResult<Table> {
        let serialized = match section {
            ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
            ConfigSection::Processing => toml::to_string_pretty(&self.settings.processing)?,
            ConfigSection::Antenna => toml::to_string_pretty(&self.settings.antenna)?,
        };
        let doc: DocumentMut = serialized.parse()?;
        Ok(doc.as_table().clone())
    }
}

/// Write `content` to `<path>` via a sibling `.tmp` file and a rename.
pub(crate) fn write_atomically(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)
}
