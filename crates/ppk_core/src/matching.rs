//! Rover → base → navigation file matching.
//!
//! The base is always chosen by exact equality of the content-derived
//! `YYYYMMDD` date. How the navigation file is chosen is an explicit
//! [`NavMatchPolicy`], logged at the start of every batch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::observation::{numeric_tokens, ObservationRecord, ObservationSet};

/// Rule used to pick the navigation file for a matched base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavMatchPolicy {
    /// First navigation record dated like the base record.
    #[default]
    ByDate,
    /// First navigation file whose name contains a 6/8-digit token of the base filename.
    FilenameToken,
}

impl NavMatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByDate => "by_date",
            Self::FilenameToken => "filename_token",
        }
    }
}

impl fmt::Display for NavMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NavMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "by_date" | "date" => Ok(Self::ByDate),
            "filename_token" | "filename" => Ok(Self::FilenameToken),
            other => Err(format!("Unknown navigation match policy: {}", other)),
        }
    }
}

/// Files selected for one external invocation.
#[derive(Debug, Clone, Copy)]
pub struct MatchedTriple<'a> {
    pub rover: &'a ObservationRecord,
    pub base: &'a ObservationRecord,
    pub nav: &'a ObservationRecord,
}

impl MatchedTriple<'_> {
    /// The shared acquisition date.
    pub fn date(&self) -> &str {
        self.rover.date().unwrap_or_default()
    }
}

/// Why a rover was left out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No stamp could be read from the rover file.
    NoRoverDate { rover: String },
    /// No base file shares the rover date.
    NoMatchingBase { rover: String, date: String },
    /// No navigation file fits the chosen base.
    NoMatchingNav {
        rover: String,
        base: String,
        date: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRoverDate { rover } => {
                write!(f, "No date found for rover file '{}'. Skipping.", rover)
            }
            Self::NoMatchingBase { rover, date } => write!(
                f,
                "No matching base file found for rover file '{}' with date '{}'. Skipping.",
                rover, date
            ),
            Self::NoMatchingNav { rover, base, date } => write!(
                f,
                "No matching navigation file found for base file '{}' with date '{}'. Skipping rover file '{}'.",
                base, date, rover
            ),
        }
    }
}

/// Select the base and navigation files for `rover`.
pub fn match_rover<'a>(
    rover: &'a ObservationRecord,
    bases: &'a ObservationSet,
    navs: &'a ObservationSet,
    policy: NavMatchPolicy,
) -> Result<MatchedTriple<'a>, SkipReason> {
    let rover_date = rover.date().ok_or_else(|| SkipReason::NoRoverDate {
        rover: rover.file_name(),
    })?;

    let base = bases
        .find_by_date(rover_date)
        .ok_or_else(|| SkipReason::NoMatchingBase {
            rover: rover.file_name(),
            date: rover_date.to_string(),
        })?;

    let nav = find_nav(base, navs, policy).ok_or_else(|| SkipReason::NoMatchingNav {
        rover: rover.file_name(),
        base: base.file_name(),
        date: base.date().unwrap_or_default().to_string(),
    })?;

    Ok(MatchedTriple { rover, base, nav })
}

/// Navigation record for `base` under `policy`.
pub fn find_nav<'a>(
    base: &ObservationRecord,
    navs: &'a ObservationSet,
    policy: NavMatchPolicy,
) -> Option<&'a ObservationRecord> {
    match policy {
        NavMatchPolicy::ByDate => navs.find_by_date(base.date()?),
        NavMatchPolicy::FilenameToken => {
            let tokens = numeric_tokens(&base.file_name());
            if tokens.is_empty() {
                return None;
            }
            navs.iter().find(|nav| {
                let nav_name = nav.file_name();
                tokens.iter().any(|token| nav_name.contains(token.as_str()))
            })
        }
    }
}
