//! Command line definition.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command};

mod inspect;
mod plan;
mod run;
mod stats;
mod sum;

pub struct Cli {
    /// Arguments passed by user
    pub matches: ArgMatches,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    /// Parse the process arguments.
    pub fn new() -> Self {
        Self {
            matches: Self::command().get_matches(),
        }
    }

    pub fn command() -> Command {
        Command::new("ppk-batch")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Batch PPK post-processing with RTKLIB")
            .long_about(
                "ppk-batch pairs rover, base and navigation files by the date
recorded in their content, prepares a working copy of the RTKLIB
configuration and runs the post-processor once per rover.",
            )
            .arg_required_else_help(true)
            .color(ColorChoice::Auto)
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .global(true)
                    .action(ArgAction::SetTrue)
                    .help("Debug logging (overrides the configured level)."),
            )
            .arg(
                Arg::new("settings")
                    .long("settings")
                    .global(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .value_name("FILE")
                    .help("Settings file (default .config/settings.toml)."),
            )
            .subcommand(run::subcommand())
            .subcommand(inspect::subcommand())
            .subcommand(plan::subcommand())
            .subcommand(stats::subcommand())
            .subcommand(sum::subcommand())
    }

    pub fn verbose(&self) -> bool {
        self.matches.get_flag("verbose")
    }

    pub fn settings_path(&self) -> Option<&PathBuf> {
        self.matches.get_one::<PathBuf>("settings")
    }
}

/// All values of a repeatable path argument.
pub fn paths(matches: &ArgMatches, id: &str) -> Vec<PathBuf> {
    matches
        .get_many::<PathBuf>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
