//! RTKLIB text configuration editing.
//!
//! RTKLIB reads a line-oriented `key    =value    # comment` file. This
//! module rewrites the handful of keys a batch needs (antenna heights,
//! antenna delta, base position) on a working copy, leaving every other
//! line byte-identical.
//!
//! # Example
//!
//! ```no_run
//! use ppk_core::rtkconf::{ConfigOverrides, WorkingConfig};
//!
//! let mut overrides = ConfigOverrides::with_defaults();
//! overrides.set("pos1-antheight", "1.800").unwrap();
//!
//! let mut working = WorkingConfig::prepare("ppk.conf", ".work", true).unwrap();
//! working.apply(&overrides);
//! working.flush().unwrap();
//! println!("run with {}", working.path().display());
//! ```

mod antenna;
mod mutator;
mod working;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use antenna::{format_offset, AntennaCatalog, AntennaDeltaTarget};
pub use mutator::{
    apply_base_coordinates, apply_overrides, read_settings, read_settings_from_str,
    BaseCoordinates, ConfigOverrides,
};
pub use working::{backup_path, WorkingConfig};

/// Keys the front end may override.
pub const RECOGNIZED_KEYS: [&str; 4] = [
    "pos1-antheight",
    "pos2-antheight",
    "ant1-antdelu",
    "ant2-antdelu",
];

/// Keys seeded with `"0.0"` in a fresh session.
pub const DEFAULT_KEYS: [&str; 3] = ["pos1-antheight", "pos2-antheight", "ant1-antdelu"];

/// Errors raised while reading or rewriting a configuration.
#[derive(Error, Debug)]
pub enum RtkConfError {
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write configuration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unrecognized configuration key: {0}")]
    UnknownKey(String),

    #[error("Unknown antenna type: {0}")]
    UnknownAntenna(String),

    #[error("Invalid {what}: '{value}'")]
    InvalidValue { what: String, value: String },
}

impl RtkConfError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(what: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            what: what.into(),
            value: value.into(),
        }
    }
}

/// Result type for configuration editing.
pub type RtkConfResult<T> = Result<T, RtkConfError>;
