// Dry run opmode
use clap::{value_parser, Arg, Command};
use std::path::PathBuf;

pub fn subcommand() -> Command {
    Command::new("match")
        .arg_required_else_help(true)
        .about("Show which rover/base/nav triples a project would run, without running them.")
        .arg(
            Arg::new("project")
                .long("project")
                .short('p')
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .required(true)
                .help(".ppk project file."),
        )
        .arg(
            Arg::new("nav-policy")
                .long("nav-policy")
                .value_parser(["by-date", "filename-token"])
                .help("How navigation files are paired with base files."),
        )
}
