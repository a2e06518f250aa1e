//! Batch runner: one worker thread, rovers strictly in sequence.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Local;

use crate::config::Settings;
use crate::logging::{BatchLogger, LogConfig, LogSink};
use crate::matching::{match_rover, MatchedTriple, NavMatchPolicy};
use crate::rtkconf::{ConfigOverrides, WorkingConfig};
use crate::stats::{QualityStatistics, StatisticsRow};
use crate::sumfile::SumFileIndex;

use super::errors::{BatchError, BatchResult};
use super::naming::unique_output_path;
use super::processor::{check_exit, Invocation, SolutionProcessor};
use super::session::BatchSession;
use super::types::{BatchEvent, BatchOutcome, BatchState, BatchSummary, CoordinateMode};

/// Name of the worker thread.
pub const WORKER_THREAD_NAME: &str = "ppk-batch-worker";

/// Everything a batch needs, fixed before it starts.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Used for the log file name.
    pub name: String,
    pub executable: PathBuf,
    /// The user's configuration. Never written.
    pub config_path: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub session: BatchSession,
    pub overrides: ConfigOverrides,
    pub coordinate_mode: CoordinateMode,
    pub nav_policy: NavMatchPolicy,
    pub backup_config: bool,
    /// Where the working configuration copy goes.
    pub work_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub log_config: LogConfig,
}

impl BatchRequest {
    pub fn new(
        executable: impl Into<PathBuf>,
        config_path: impl Into<PathBuf>,
        session: BatchSession,
    ) -> Self {
        Self {
            name: format!("batch_{}", Local::now().format("%Y%m%d_%H%M%S")),
            executable: executable.into(),
            config_path: config_path.into(),
            output_dir: None,
            session,
            overrides: ConfigOverrides::new(),
            coordinate_mode: CoordinateMode::FromConfig,
            nav_policy: NavMatchPolicy::default(),
            backup_config: true,
            work_dir: PathBuf::from(".work"),
            logs_dir: PathBuf::from(".logs"),
            log_config: LogConfig::default(),
        }
    }

    /// Take policy, folders and logging from application settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.nav_policy = settings.processing.nav_match_policy;
        self.backup_config = settings.processing.backup_config;
        self.work_dir = PathBuf::from(&settings.paths.work_folder);
        self.logs_dir = PathBuf::from(&settings.paths.logs_folder);
        self.log_config = settings.logging.to_log_config();
        if self.output_dir.is_none() && !settings.paths.output_directory.is_empty() {
            self.output_dir = Some(PathBuf::from(&settings.paths.output_directory));
        }
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Check that a run can start.
    pub fn validate(&self) -> BatchResult<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(BatchError::validation("No post-processing executable selected"));
        }
        if !self.executable.is_file() {
            return Err(BatchError::validation(format!(
                "Executable not found: {}",
                self.executable.display()
            )));
        }
        if self.config_path.as_os_str().is_empty() || !self.config_path.is_file() {
            return Err(BatchError::validation(format!(
                "Configuration file not found: {}",
                self.config_path.display()
            )));
        }
        if self.session.rovers.is_empty() {
            return Err(BatchError::validation("No rover files selected"));
        }
        if self.session.bases.is_empty() {
            return Err(BatchError::validation("No base files selected"));
        }
        if self.session.navs.is_empty() {
            return Err(BatchError::validation("No navigation files selected"));
        }
        match &self.output_dir {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(()),
            _ => Err(BatchError::validation("Output directory is not set")),
        }
    }
}

/// Handle for cancelling a running batch.
///
/// The batch stops at the next rover boundary; a running external process
/// is left to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A batch running on its worker thread.
pub struct BatchHandle {
    join: JoinHandle<BatchSummary>,
    cancel: CancelHandle,
}

impl BatchHandle {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker. `None` if it panicked.
    pub fn join(self) -> Option<BatchSummary> {
        self.join.join().ok()
    }
}

/// Wraps the event sender and remembers when the front end went away.
struct EventSink {
    events: Sender<BatchEvent>,
    disconnected: AtomicBool,
}

impl EventSink {
    fn emit(&self, event: BatchEvent) {
        if self.events.send(event).is_err() && !self.disconnected.swap(true, Ordering::SeqCst) {
            tracing::debug!("Batch event receiver dropped");
        }
    }

    fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

/// Drives one batch from validation to the final summary.
pub struct BatchRunner {
    request: BatchRequest,
    cancel: CancelHandle,
}

impl BatchRunner {
    /// Validate `request` and build a runner for it.
    pub fn new(request: BatchRequest) -> BatchResult<Self> {
        request.validate()?;
        Ok(Self {
            request,
            cancel: CancelHandle::new(),
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Validate, then run the batch on a new worker thread.
    ///
    /// Fails only if validation fails or the thread cannot be created; no
    /// rover is touched in either case.
    pub fn spawn<P>(
        request: BatchRequest,
        processor: P,
        events: Sender<BatchEvent>,
    ) -> BatchResult<BatchHandle>
    where
        P: SolutionProcessor + 'static,
    {
        if events.send(BatchEvent::StateChanged(BatchState::Validating)).is_err() {
            tracing::debug!("Batch event receiver dropped before start");
        }
        let runner = Self::new(request)?;
        let cancel = runner.cancel_handle();

        let join = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || runner.run(&processor, events))
            .map_err(BatchError::WorkerSpawn)?;

        Ok(BatchHandle { join, cancel })
    }

    /// Run the batch on the current thread.
    ///
    /// Sends `Completed(summary)` as the last event and also returns it.
    pub fn run(self, processor: &dyn SolutionProcessor, events: Sender<BatchEvent>) -> BatchSummary {
        let sink = Arc::new(EventSink {
            events,
            disconnected: AtomicBool::new(false),
        });
        sink.emit(BatchEvent::StateChanged(BatchState::Running));

        let request = &self.request;
        let logger = open_logger(request, Arc::clone(&sink));

        let mut summary = BatchSummary::new(&request.name, request.session.rovers.len());
        summary.log_path = logger.log_path().map(Path::to_path_buf);
        summary.outcome = self.run_rovers(processor, &logger, &sink, &mut summary);

        match &summary.outcome {
            BatchOutcome::Completed => logger.success("Batch PPK Processing Completed."),
            BatchOutcome::Aborted(reason) => {
                logger.error(&format!("Batch aborted: {}", reason))
            }
            BatchOutcome::Cancelled => logger.warn("Batch cancelled"),
        }
        logger.info(&summary.to_string());
        logger.close();

        sink.emit(BatchEvent::StateChanged(BatchState::Completed));
        sink.emit(BatchEvent::Completed(summary.clone()));
        summary
    }

    fn run_rovers(
        &self,
        processor: &dyn SolutionProcessor,
        logger: &BatchLogger,
        sink: &EventSink,
        summary: &mut BatchSummary,
    ) -> BatchOutcome {
        let request = &self.request;
        let session = &request.session;
        let total = session.rovers.len();

        logger.phase("Batch Processing");
        logger.info(&format!("Executable: {}", request.executable.display()));
        logger.info(&format!("Configuration: {}", request.config_path.display()));
        logger.info(&format!("Navigation matching: {}", request.nav_policy));
        logger.info(&format!("Base coordinates: {}", request.coordinate_mode));
        logger.info(&format!(
            "{} rover, {} base, {} navigation file(s)",
            total,
            session.bases.len(),
            session.navs.len()
        ));

        let Some(output_dir) = request.output_dir.as_deref() else {
            return BatchOutcome::Aborted("Output directory is not set".to_string());
        };
        if let Err(e) = fs::create_dir_all(output_dir) {
            return BatchOutcome::Aborted(
                BatchError::io("creating output directory", e).to_string(),
            );
        }

        let mut working = match self.prepare_config(logger) {
            Ok(working) => working,
            Err(e) => return BatchOutcome::Aborted(e.to_string()),
        };

        let sum_index = match request.coordinate_mode {
            CoordinateMode::Auto => {
                let index = SumFileIndex::from_paths(&session.sum_files);
                if index.is_empty() {
                    logger.warn("Auto coordinate mode without .sum files, using configuration positions");
                }
                index
            }
            _ => SumFileIndex::new(),
        };

        for rover in session.rovers.iter() {
            if self.cancel.is_cancelled() {
                return BatchOutcome::Cancelled;
            }
            if sink.is_disconnected() {
                tracing::debug!("Front end gone, stopping batch");
                return BatchOutcome::Cancelled;
            }

            let rover_name = rover.file_name();
            let mut abort = None;

            match match_rover(rover, &session.bases, &session.navs, request.nav_policy) {
                Err(reason) => {
                    logger.skip(&reason.to_string());
                    summary.skipped += 1;
                    sink.emit(BatchEvent::RoverSkipped {
                        rover: rover_name,
                        reason,
                    });
                }
                Ok(triple) => {
                    match self.process_rover(
                        &triple,
                        processor,
                        &mut working,
                        &sum_index,
                        output_dir,
                        logger,
                    ) {
                        Ok(row) => {
                            summary.succeeded += 1;
                            if let Some(row) = row {
                                summary.statistics.push(row.clone());
                                sink.emit(BatchEvent::Statistics(row));
                            }
                        }
                        Err(e) => {
                            summary.failed += 1;
                            if e.aborts_batch() {
                                abort = Some(e.to_string());
                            }
                            sink.emit(BatchEvent::RoverFailed {
                                rover: rover_name,
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }

            summary.processed += 1;
            logger.progress(summary.processed, total);
            sink.emit(BatchEvent::Progress {
                processed: summary.processed,
                total,
            });

            if let Some(reason) = abort {
                return BatchOutcome::Aborted(reason);
            }
        }

        BatchOutcome::Completed
    }

    /// Back up the original, write the working copy with overrides and
    /// (manual mode) the fixed base position.
    fn prepare_config(&self, logger: &BatchLogger) -> BatchResult<WorkingConfig> {
        let request = &self.request;
        let mut working = WorkingConfig::prepare(
            &request.config_path,
            &request.work_dir,
            request.backup_config,
        )
        .map_err(|e| {
            logger.error(&format!("Failed to prepare configuration: {}", e));
            BatchError::from(e)
        })?;

        if !request.overrides.is_empty() {
            working.apply(&request.overrides);
            for (key, value) in request.overrides.iter() {
                logger.debug(&format!("{}={}", key, value));
            }
        }

        if let CoordinateMode::Manual(coords) = &request.coordinate_mode {
            working.set_base_coordinates(coords);
            logger.info("Manual mode: using fixed base coordinates for all files");
        }

        working.flush().map_err(|e| {
            logger.error(&format!("Failed to write working configuration: {}", e));
            BatchError::from(e)
        })?;
        logger.info(&format!("Working configuration: {}", working.path().display()));
        Ok(working)
    }

    /// Run one matched rover. `Ok(None)` means the solution had no usable
    /// quality data.
    fn process_rover(
        &self,
        triple: &MatchedTriple<'_>,
        processor: &dyn SolutionProcessor,
        working: &mut WorkingConfig,
        sum_index: &SumFileIndex,
        output_dir: &Path,
        logger: &BatchLogger,
    ) -> BatchResult<Option<StatisticsRow>> {
        let rover = triple.rover;

        if matches!(self.request.coordinate_mode, CoordinateMode::Auto) {
            match sum_index.lookup(triple.date()) {
                Some(coords) => {
                    working.set_base_coordinates(&coords);
                    working.flush().map_err(|e| {
                        logger.error(&format!("Failed to update base coordinates: {}", e));
                        BatchError::from(e)
                    })?;
                    logger.info(&format!(
                        "Base coordinates for {}: lat {}, lon {}, h {}",
                        rover.file_name(),
                        coords.latitude,
                        coords.longitude,
                        coords.height
                    ));
                }
                None => logger.info(&format!(
                    "No .sum coordinates for date {}, keeping previous base position",
                    triple.date()
                )),
            }
        }

        let output = unique_output_path(output_dir, rover.name());
        let default_name = format!("{}.pos", rover.name());
        let output_name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if output_name != default_name {
            logger.info(&format!(
                "File '{}' exists, saving as '{}'",
                default_name, output_name
            ));
        }

        let invocation = Invocation {
            config: working.path(),
            output: &output,
            rover: rover.path(),
            base: triple.base.path(),
            nav: triple.nav.path(),
        };
        logger.command(&processor.command_line(&invocation));

        let tool = processor.name();
        let result = processor.process(&invocation).map_err(|e| {
            logger.error(&format!("Error during processing: {}", e));
            e
        })?;

        logger.clear_tail();
        for line in result.stdout.lines() {
            logger.output_line(line, false);
        }
        for line in result.stderr.lines() {
            logger.output_line(line, true);
        }

        if let Err(e) = check_exit(&tool, &result) {
            logger.error(&format!(
                "Error for rover: {}. Error message: {}",
                rover.file_name(),
                result.stderr.trim_end()
            ));
            logger.show_tail(&tool);
            return Err(e);
        }
        logger.success(&format!("Processing completed for rover: {}", rover.file_name()));

        let stats = QualityStatistics::compute(&output).map_err(|e| {
            logger.error(&format!("Error computing quality statistics: {}", e));
            BatchError::from(e)
        })?;

        match stats {
            Some(stats) => {
                let row = StatisticsRow::from_stats(output_name, &stats);
                logger.info(&row.to_string());
                Ok(Some(row))
            }
            None => {
                logger.warn(&format!("No valid quality data found in {}", output.display()));
                Ok(None)
            }
        }
    }
}

fn open_logger(request: &BatchRequest, sink: Arc<EventSink>) -> BatchLogger {
    let make_sink = || -> LogSink {
        let sink = Arc::clone(&sink);
        Box::new(move |line: &str| sink.emit(BatchEvent::Log(line.to_string())))
    };

    match BatchLogger::new(
        &request.name,
        &request.logs_dir,
        request.log_config.clone(),
        Some(make_sink()),
    ) {
        Ok(logger) => logger,
        Err(e) => {
            tracing::warn!(
                "Could not create batch log in {}: {}",
                request.logs_dir.display(),
                e
            );
            BatchLogger::sink_only(&request.name, request.log_config.clone(), Some(make_sink()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{FileRole, ObservationRecord};
    use std::sync::mpsc;
    use tempfile::tempdir;

    fn session_with_one_triple() -> BatchSession {
        let mut session = BatchSession::new();
        for (path, role) in [
            ("/r/rover.obs", FileRole::Rover),
            ("/b/base.obs", FileRole::Base),
            ("/n/nav.nav", FileRole::Navigation),
        ] {
            session.set_mut(role).add(ObservationRecord::new(
                path,
                role,
                Some("20240615".into()),
                None,
            ));
        }
        session
    }

    #[test]
    fn validation_rejects_missing_executable() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("ppk.conf");
        fs::write(&config, "").unwrap();

        let request = BatchRequest::new(dir.path().join("absent"), &config, session_with_one_triple())
            .with_output_dir(dir.path());
        let err = request.validate().unwrap_err();
        assert!(matches!(err, BatchError::Validation(ref m) if m.contains("Executable")));
    }

    #[test]
    fn validation_requires_every_role_and_output() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("rnx2rtkp");
        let config = dir.path().join("ppk.conf");
        fs::write(&exe, "").unwrap();
        fs::write(&config, "").unwrap();

        let mut session = session_with_one_triple();
        session.navs.clear();
        let request = BatchRequest::new(&exe, &config, session).with_output_dir(dir.path());
        assert!(request.validate().is_err());

        let request = BatchRequest::new(&exe, &config, session_with_one_triple());
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("Output directory"));

        let request = BatchRequest::new(&exe, &config, session_with_one_triple())
            .with_output_dir(dir.path());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn spawn_fails_fast_on_invalid_request() {
        let (tx, rx) = mpsc::channel();
        let request = BatchRequest::new("", "", BatchSession::new());
        let processor = crate::batch::RtkPostProcessor::new("rnx2rtkp");

        assert!(BatchRunner::spawn(request, processor, tx).is_err());
        let events: Vec<BatchEvent> = rx.try_iter().collect();
        assert!(matches!(
            events.as_slice(),
            [BatchEvent::StateChanged(BatchState::Validating)]
        ));
    }

    #[test]
    fn cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }
}
