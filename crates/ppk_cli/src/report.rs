//! Read-only opmodes: `inspect`, `match`, `stats` and `sum`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;

use ppk_core::config::Settings;
use ppk_core::matching::NavMatchPolicy;
use ppk_core::observation::{FileRole, ObservationRecord};
use ppk_core::project::Project;
use ppk_core::stats::{QualityStatistics, StatisticsRow};
use ppk_core::sumfile::{format_date, SumFileCoordinates};

use crate::cli::paths;

pub fn inspect(matches: &ArgMatches) -> Result<ExitCode> {
    let role: FileRole = matches
        .get_one::<String>("role")
        .map(String::as_str)
        .unwrap_or("rover")
        .parse()?;

    for path in paths(matches, "files") {
        let record = ObservationRecord::from_path(path, role);
        println!("{}", record.display_label());
    }
    Ok(ExitCode::SUCCESS)
}

/// Nav policy from the command line, else from the settings.
pub fn nav_policy(matches: &ArgMatches, settings: &Settings) -> Result<NavMatchPolicy> {
    match matches.get_one::<String>("nav-policy") {
        Some(value) => value.parse().map_err(|e: String| anyhow!(e)),
        None => Ok(settings.processing.nav_match_policy),
    }
}

pub fn plan(matches: &ArgMatches, settings: &Settings) -> Result<ExitCode> {
    let project_path = matches
        .get_one::<PathBuf>("project")
        .ok_or_else(|| anyhow!("--project is required"))?;
    let project = Project::load(project_path)?;
    let policy = nav_policy(matches, settings)?;
    let session = project.into_session();

    println!("Navigation matching: {}", policy);
    let mut runnable = 0;
    for entry in session.plan(policy) {
        match entry {
            Ok(triple) => {
                runnable += 1;
                println!(
                    "{} [{}]: base {}, nav {}",
                    triple.rover.file_name(),
                    triple.date(),
                    triple.base.file_name(),
                    triple.nav.file_name()
                );
            }
            Err(reason) => println!("{}", reason),
        }
    }
    println!("{}/{} rover(s) would run", runnable, session.rovers.len());
    Ok(ExitCode::SUCCESS)
}

pub fn stats(matches: &ArgMatches) -> Result<ExitCode> {
    let mut failed = false;
    println!("{}", StatisticsRow::header().join("\t"));

    for path in paths(matches, "files") {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match QualityStatistics::compute(&path) {
            Ok(Some(stats)) => println!("{}", StatisticsRow::from_stats(file, &stats)),
            Ok(None) => println!("{}\tno quality data", file),
            Err(e) => {
                tracing::error!("{}", e);
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub fn sum(matches: &ArgMatches) -> Result<ExitCode> {
    let show = |value: Option<f64>, decimals: usize| {
        value
            .map(|v| format!("{:.*}", decimals, v))
            .unwrap_or_else(|| "-".to_string())
    };

    for path in paths(matches, "files") {
        let coords = SumFileCoordinates::parse(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let date = coords
            .date
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "no date".to_string());
        println!(
            "{}\t{}\tlat {}\tlon {}\th {}",
            path.display(),
            date,
            show(coords.latitude_dd, 9),
            show(coords.longitude_dd, 9),
            show(coords.elevation_m, 4)
        );
    }
    Ok(ExitCode::SUCCESS)
}
