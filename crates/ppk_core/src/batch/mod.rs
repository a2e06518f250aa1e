//! Batch post-processing of rover files.
//!
//! A batch matches every rover of a [`BatchSession`] with a base and a
//! navigation file, prepares a working copy of the RTKLIB configuration,
//! invokes the external processor once per rover and tallies the quality
//! of each solution.
//!
//! # Architecture
//!
//! ```text
//! front end ──spawn──▶ ppk-batch-worker
//!     ▲                   ├── prepare working config (backup, overrides, manual coords)
//!     │                   └── for each rover:
//!     │                         match → [auto coords] → invoke → statistics
//!     └──── mpsc<BatchEvent> ◀──┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::mpsc;
//! use ppk_core::batch::{BatchEvent, BatchRequest, BatchRunner, BatchSession, RtkPostProcessor};
//! use ppk_core::observation::FileRole;
//!
//! let mut session = BatchSession::new();
//! session.import(FileRole::Rover, ["rover.obs"]);
//! session.import(FileRole::Base, ["base.obs"]);
//! session.import(FileRole::Navigation, ["brdc.nav"]);
//!
//! let request = BatchRequest::new("rnx2rtkp", "ppk.conf", session).with_output_dir("out");
//! let (tx, rx) = mpsc::channel();
//! let handle = BatchRunner::spawn(request, RtkPostProcessor::new("rnx2rtkp"), tx).unwrap();
//!
//! for event in rx {
//!     if let BatchEvent::Log(line) = event {
//!         println!("{}", line);
//!     }
//! }
//! let summary = handle.join();
//! ```

mod errors;
mod naming;
mod processor;
mod runner;
mod session;
mod types;

pub use errors::{BatchError, BatchResult};
pub use naming::{unique_output_path, SOLUTION_EXTENSION};
pub use processor::{check_exit, Invocation, RtkPostProcessor, SolutionProcessor};
pub use runner::{
    BatchHandle, BatchRequest, BatchRunner, CancelHandle, WORKER_THREAD_NAME,
};
pub use session::BatchSession;
pub use types::{
    BatchEvent, BatchOutcome, BatchState, BatchSummary, CoordinateMode, ProcessOutput,
};
