// Solution statistics opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

pub fn subcommand() -> Command {
    Command::new("stats")
        .arg_required_else_help(true)
        .about("Print q1..q5 percentages of RTKLIB solution files.")
        .arg(
            Arg::new("files")
                .value_parser(value_parser!(PathBuf))
                .value_name("POS")
                .action(ArgAction::Append)
                .required(true)
                .help("Solution (.pos) files."),
        )
}
