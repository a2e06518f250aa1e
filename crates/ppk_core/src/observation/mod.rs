//! Observation files and their embedded acquisition time.
//!
//! Every rover, base and navigation file imported into a session is scanned
//! once for the date/time it was recorded. Matching later compares those
//! dates, never the filenames (see [`crate::matching`]).
//!
//! # Example
//!
//! ```no_run
//! use ppk_core::observation::{FileRole, ObservationRecord, ObservationSet};
//!
//! let mut rovers = ObservationSet::new(FileRole::Rover);
//! rovers.add(ObservationRecord::from_path("flight_01.obs", FileRole::Rover));
//!
//! for rover in rovers.iter() {
//!     println!("{}", rover.display_label());
//! }
//! ```

mod parser;
mod record;
mod set;

pub use parser::{
    date_from_filename, numeric_tokens, parse_date_time, scan_date_time, FIRST_OBS_MARKER,
};
pub use record::{FileRole, ObservationError, ObservationRecord, ObservationResult};
pub use set::ObservationSet;
