// File inspection opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

pub fn subcommand() -> Command {
    Command::new("inspect")
        .arg_required_else_help(true)
        .about("Print the date and time found in observation files.")
        .arg(
            Arg::new("files")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Append)
                .required(true)
                .help("Files to scan."),
        )
        .arg(
            Arg::new("role")
                .long("role")
                .value_parser(["rover", "base", "nav"])
                .default_value("rover")
                .help("Scan rules to apply. Base and nav also accept the second-line stamp."),
        )
}
