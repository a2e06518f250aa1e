//! Logging infrastructure for the PPK batch processor.
//!
//! This module provides:
//! - Global `tracing` setup (stderr, optionally a daily rolling file)
//! - Per-batch loggers with file + sink dual output
//! - Tail buffer of external tool output for error diagnosis
//!
//! # Example
//!
//! ```no_run
//! use ppk_core::logging::{BatchLogger, LogConfig};
//!
//! let logger = BatchLogger::new("batch_20240615", ".logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("Batch Processing");
//! logger.command("rnx2rtkp -k ppk.conf -o rover.pos rover.obs base.obs nav.nav");
//! logger.success("rover.pos written");
//! ```

mod batch_logger;
mod types;

use std::path::Path;

pub use batch_logger::BatchLogger;
pub use types::{LogConfig, LogLevel, LogSink, MessagePrefix};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}

/// Initialize global tracing subscriber for application-wide logging.
///
/// Respects `RUST_LOG`, falling back to `default_level`, and writes to stderr.
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(env_filter(default_level))
        .try_init();
}

/// Like [`init_tracing`], plus a daily rolling file `<log_dir>/ppk-batch.log.YYYY-MM-DD`.
///
/// Keep the returned guard alive for the lifetime of the program, dropping it
/// flushes the file writer.
pub fn init_tracing_with_file(default_level: LogLevel, log_dir: impl AsRef<Path>) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir.as_ref(), "ppk-batch.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_thread_names(true),
        )
        .with(env_filter(default_level))
        .try_init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
