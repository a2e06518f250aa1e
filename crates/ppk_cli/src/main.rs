//! `ppk-batch`: command line front end of the PPK batch processor.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use ppk_core::config::{ConfigManager, DEFAULT_SETTINGS_PATH};
use ppk_core::logging::{init_tracing, init_tracing_with_file, LogLevel};

mod cli;
mod report;
mod run;

use cli::Cli;

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::new();

    let settings_path = cli
        .settings_path()
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let mut manager = ConfigManager::new(&settings_path);
    let load_result = manager.load_or_create();

    let level = if cli.verbose() {
        LogLevel::Debug
    } else {
        manager.settings().logging.level
    };

    // Keeps the rolling file writer alive until exit.
    let _guard = match cli.matches.subcommand_name() {
        Some("run") => {
            if let Err(e) = manager.ensure_dirs_exist() {
                eprintln!("Warning: could not create working folders: {}", e);
            }
            Some(init_tracing_with_file(level, manager.logs_folder()))
        }
        _ => {
            init_tracing(level);
            None
        }
    };

    if let Err(e) = load_result {
        tracing::warn!(
            "Could not load settings from {}, using defaults: {}",
            settings_path.display(),
            e
        );
    }
    tracing::debug!("ppk-batch {}", ppk_core::version());

    match cli.matches.subcommand() {
        Some(("run", matches)) => run::execute(matches, manager.settings()),
        Some(("inspect", matches)) => report::inspect(matches),
        Some(("match", matches)) => report::plan(matches, manager.settings()),
        Some(("stats", matches)) => report::stats(matches),
        Some(("sum", matches)) => report::sum(matches),
        _ => Ok(ExitCode::SUCCESS),
    }
}
