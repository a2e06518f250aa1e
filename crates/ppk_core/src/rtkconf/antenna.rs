//! Antenna model offsets.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{RtkConfError, RtkConfResult};

/// Which antenna delta keys receive the computed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntennaDeltaTarget {
    /// `ant1-antdelu` only.
    #[default]
    RoverOnly,
    /// `ant1-antdelu` and `ant2-antdelu`.
    RoverAndBase,
}

impl AntennaDeltaTarget {
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::RoverOnly => &["ant1-antdelu"],
            Self::RoverAndBase => &["ant1-antdelu", "ant2-antdelu"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoverOnly => "rover_only",
            Self::RoverAndBase => "rover_and_base",
        }
    }
}

impl fmt::Display for AntennaDeltaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AntennaDeltaTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "rover_only" | "rover" => Ok(Self::RoverOnly),
            "rover_and_base" | "both" => Ok(Self::RoverAndBase),
            other => Err(format!("Unknown antenna delta target: {}", other)),
        }
    }
}

/// Known antenna models and their vertical offset in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AntennaCatalog {
    offsets: BTreeMap<String, f64>,
}

impl Default for AntennaCatalog {
    fn default() -> Self {
        let mut offsets = BTreeMap::new();
        offsets.insert("EMLID RS2".to_string(), -0.135);
        offsets.insert("FOIF A30".to_string(), -0.088);
        Self { offsets }
    }
}

impl AntennaCatalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self {
            offsets: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, model: impl Into<String>, offset: f64) {
        self.offsets.insert(model.into(), offset);
    }

    pub fn offset(&self, model: &str) -> Option<f64> {
        self.offsets.get(model).copied()
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.offsets.keys().map(String::as_str)
    }

    /// Model offset plus a user-entered manual offset.
    pub fn total_offset(&self, model: &str, manual_offset: f64) -> RtkConfResult<f64> {
        let offset = self
            .offset(model)
            .ok_or_else(|| RtkConfError::UnknownAntenna(model.to_string()))?;
        Ok(offset + manual_offset)
    }
}

/// Offsets are written with 3 decimals.
pub fn format_offset(value: f64) -> String {
    format!("{:.3}", value)
}
