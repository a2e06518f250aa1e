//! PPK Core - Backend logic for the PPK Batch Processor
//!
//! This crate contains all business logic with zero UI dependencies.
//! It can be used by a GUI application or the `ppk-batch` CLI.
//!
//! The pieces, leaf-first:
//! - [`observation`]: date/time extraction from rover, base and navigation files
//! - [`matching`]: rover → base → navigation selection
//! - [`rtkconf`]: working-copy edits of the RTKLIB configuration file
//! - [`sumfile`]: base coordinates from survey summary (`.sum`) files
//! - [`stats`]: solution quality percentages from `.pos` output
//! - [`batch`]: the sequential batch runner and its event channel
//! - [`project`]: `.ppk` project persistence

pub mod batch;
pub mod config;
pub mod logging;
pub mod matching;
pub mod observation;
pub mod project;
pub mod rtkconf;
pub mod stats;
pub mod sumfile;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
