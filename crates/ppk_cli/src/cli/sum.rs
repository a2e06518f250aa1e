// Survey summary opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

pub fn subcommand() -> Command {
    Command::new("sum")
        .arg_required_else_help(true)
        .about("Print base coordinates parsed from survey summary files.")
        .arg(
            Arg::new("files")
                .value_parser(value_parser!(PathBuf))
                .value_name("SUM")
                .action(ArgAction::Append)
                .required(true)
                .help("Summary (.sum) files."),
        )
}
