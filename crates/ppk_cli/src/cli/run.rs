// Batch run opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

pub fn subcommand() -> Command {
    Command::new("run")
        .about("Run the batch: one RTKLIB invocation per matched rover.")
        .next_help_heading("Inputs")
        .arg(
            Arg::new("project")
                .long("project")
                .short('p')
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .help("Load files and settings from a .ppk project. Other options take precedence."),
        )
        .arg(
            Arg::new("exe")
                .long("exe")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .help("Post-processing executable (rnx2rtkp)."),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('k')
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .help("RTKLIB configuration file. It is never modified."),
        )
        .arg(
            Arg::new("rover")
                .long("rover")
                .short('r')
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Rover observation file(s)."),
        )
        .arg(
            Arg::new("base")
                .long("base")
                .short('b')
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Base observation file(s)."),
        )
        .arg(
            Arg::new("nav")
                .long("nav")
                .short('n')
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Navigation file(s)."),
        )
        .arg(
            Arg::new("sum")
                .long("sum")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Survey summary file(s). Base coordinates are then taken per rover date."),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_parser(value_parser!(PathBuf))
                .value_name("DIR")
                .help("Output directory. Defaults to the settings, then to the last one used."),
        )
        .next_help_heading("Base position")
        .arg(
            Arg::new("lat")
                .long("lat")
                .value_name("DEG")
                .allow_hyphen_values(true)
                .requires_all(["lon", "height"])
                .help("Base latitude in decimal degrees."),
        )
        .arg(
            Arg::new("lon")
                .long("lon")
                .value_name("DEG")
                .allow_hyphen_values(true)
                .requires_all(["lat", "height"])
                .help("Base longitude in decimal degrees."),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("M")
                .allow_hyphen_values(true)
                .requires_all(["lat", "lon"])
                .help("Base ellipsoidal height in meters."),
        )
        .next_help_heading("Configuration values")
        .arg(
            Arg::new("set")
                .long("set")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append)
                .help("Override a configuration value (pos1-antheight, pos2-antheight, ant1-antdelu, ant2-antdelu)."),
        )
        .arg(
            Arg::new("antenna")
                .long("antenna")
                .value_name("MODEL")
                .help("Antenna model from the settings catalog."),
        )
        .arg(
            Arg::new("manual-offset")
                .long("manual-offset")
                .value_parser(value_parser!(f64))
                .value_name("M")
                .allow_hyphen_values(true)
                .help("Added to the antenna model offset."),
        )
        .arg(
            Arg::new("nav-policy")
                .long("nav-policy")
                .value_parser(["by-date", "filename-token"])
                .help("How navigation files are paired with base files."),
        )
        .next_help_heading("Project")
        .arg(
            Arg::new("save-project")
                .long("save-project")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .help("Save inputs, logs and statistics to a .ppk project after the run."),
        )
}
