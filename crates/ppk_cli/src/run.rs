//! `run` opmode: assemble a batch request, run it and report.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;

use ppk_core::batch::{
    BatchError, BatchEvent, BatchOutcome, BatchRequest, BatchRunner, BatchSession, BatchSummary,
    CoordinateMode, RtkPostProcessor,
};
use ppk_core::config::{RecentState, Settings, RECENT_STATE_FILE};
use ppk_core::observation::FileRole;
use ppk_core::project::Project;
use ppk_core::rtkconf::{BaseCoordinates, ConfigOverrides};
use ppk_core::stats::StatisticsRow;

use crate::cli::paths;
use crate::report::nav_policy;

/// Event drain tick.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn execute(matches: &ArgMatches, settings: &Settings) -> Result<ExitCode> {
    let project = match matches.get_one::<PathBuf>("project") {
        Some(path) => Some(Project::load(path)?),
        None => None,
    };

    let mut session = project
        .as_ref()
        .map(Project::into_session)
        .unwrap_or_default();
    session.import(FileRole::Rover, paths(matches, "rover"));
    session.import(FileRole::Base, paths(matches, "base"));
    session.import(FileRole::Navigation, paths(matches, "nav"));
    session.import_sum_files(paths(matches, "sum"));

    let executable = matches
        .get_one::<PathBuf>("exe")
        .cloned()
        .or_else(|| project.as_ref().and_then(Project::executable))
        .or_else(|| non_empty(&settings.processing.executable))
        .unwrap_or_default();
    let config = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .or_else(|| project.as_ref().and_then(Project::config))
        .unwrap_or_default();

    let overrides = build_overrides(matches, settings, project.as_ref())?;
    let coordinate_mode = coordinate_mode(matches, &session, project.as_ref())?;

    let mut request = BatchRequest::new(&executable, &config, session.clone());
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        request = request.with_output_dir(output);
    }
    request = request.with_settings(settings);
    let recent = RecentState::load_or_default(RECENT_STATE_FILE);
    if request.output_dir.is_none() {
        request.output_dir = recent.output_directory();
    }
    request.nav_policy = nav_policy(matches, settings)?;
    request.overrides = overrides.clone();
    request.coordinate_mode = coordinate_mode.clone();
    let output_dir = request.output_dir.clone();

    let (tx, rx) = mpsc::channel();
    let processor = RtkPostProcessor::new(&executable);
    let handle = match BatchRunner::spawn(request, processor, tx) {
        Ok(handle) => handle,
        Err(BatchError::Validation(message)) => {
            eprintln!("Cannot start batch: {}", message);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("starting batch"),
    };

    let logs = drain_events(&rx);
    let summary = handle
        .join()
        .ok_or_else(|| anyhow!("batch worker panicked"))?;

    print_statistics(&summary.statistics);
    println!("{}", summary);
    if let Some(log_path) = &summary.log_path {
        println!("Log: {}", log_path.display());
    }

    if let Some(dir) = output_dir {
        let state = RecentState {
            output_directory: dir.display().to_string(),
        };
        if state != recent {
            if let Err(e) = state.save(RECENT_STATE_FILE) {
                tracing::warn!("Could not remember output directory: {}", e);
            }
        }
    }

    if let Some(path) = matches.get_one::<PathBuf>("save-project") {
        let mut saved = Project::from_session(&session, logs.join("\n"), summary.statistics.clone());
        saved.executable_path = executable.display().to_string();
        saved.config_path = config.display().to_string();
        saved.set_overrides(&overrides);
        if let CoordinateMode::Manual(coords) = &coordinate_mode {
            saved.set_base_coordinates(coords);
        } else if let Some(previous) = &project {
            saved.base_coordinates = previous.base_coordinates.clone();
        }
        saved.save(path)?;
    }

    Ok(exit_code(&summary))
}

/// Print events until the worker hangs up; returns the log lines.
fn drain_events(rx: &Receiver<BatchEvent>) -> Vec<String> {
    let mut logs = Vec::new();
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(BatchEvent::Log(line)) => {
                println!("{}", line);
                logs.push(line);
            }
            Ok(BatchEvent::StateChanged(state)) => tracing::debug!("Batch {}", state),
            Ok(BatchEvent::Completed(_)) => {}
            Ok(event) => tracing::trace!("{:?}", event),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    logs
}

fn build_overrides(
    matches: &ArgMatches,
    settings: &Settings,
    project: Option<&Project>,
) -> Result<ConfigOverrides> {
    let mut overrides = project.map(Project::overrides).unwrap_or_default();

    if let Some(pairs) = matches.get_many::<String>("set") {
        for pair in pairs {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", pair))?;
            overrides.set(key.trim(), value.trim())?;
        }
    }

    let model = matches
        .get_one::<String>("antenna")
        .cloned()
        .or_else(|| settings.antenna.selected.clone());
    let manual_offset = matches.get_one::<f64>("manual-offset").copied();
    match (model, manual_offset) {
        (Some(model), manual) => {
            let total = settings
                .antenna
                .types
                .total_offset(&model, manual.unwrap_or(0.0))?;
            overrides.apply_antenna_offset(total, settings.processing.antenna_delta_target);
            tracing::info!("Antenna {}: offset {:.3} m", model, total);
        }
        (None, Some(_)) => bail!("--manual-offset needs an antenna model (--antenna)"),
        (None, None) => {}
    }

    Ok(overrides)
}

/// `--lat/--lon/--height` win, then `.sum` files, then the project's position.
fn coordinate_mode(
    matches: &ArgMatches,
    session: &BatchSession,
    project: Option<&Project>,
) -> Result<CoordinateMode> {
    let value = |id: &str| matches.get_one::<String>(id);
    if let (Some(lat), Some(lon), Some(height)) = (value("lat"), value("lon"), value("height")) {
        return Ok(CoordinateMode::Manual(BaseCoordinates::new(lat, lon, height)?));
    }
    if !session.sum_files.is_empty() {
        return Ok(CoordinateMode::Auto);
    }
    Ok(project
        .and_then(Project::base_coordinates)
        .map(CoordinateMode::Manual)
        .unwrap_or_default())
}

fn print_statistics(rows: &[StatisticsRow]) {
    if rows.is_empty() {
        return;
    }
    println!();
    println!("{}", StatisticsRow::header().join("\t"));
    for row in rows {
        println!("{}", row);
    }
}

fn exit_code(summary: &BatchSummary) -> ExitCode {
    match summary.outcome {
        BatchOutcome::Aborted(_) => ExitCode::FAILURE,
        BatchOutcome::Completed | BatchOutcome::Cancelled => ExitCode::SUCCESS,
    }
}

fn non_empty(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| Path::new(value).to_path_buf())
}
