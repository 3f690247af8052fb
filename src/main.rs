// Enable warnings for all clippy lints.
#![warn(
    clippy::correctness,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::cargo,
    clippy::restriction
)]
// Now selectively disable unneeded lints.
#![allow(
    clippy::implicit_return,                // Allow.
    clippy::missing_docs_in_private_items,  // Disabled.
    clippy::missing_errors_doc,             // Disabled.
    clippy::expect_used,                    // Should use `expect` rather than `unwrap`.
    clippy::blanket_clippy_restriction_lints,
    clippy::exhaustive_enums,
    clippy::default_numeric_fallback,
    clippy::wildcard_enum_match_arm
)]
// Mark some lints as errors.
#![deny(clippy::print_stdout)]

use clap::{arg_enum, value_t, App, Arg, ArgMatches};
use graphconnect::coloring::Doubling;
use graphconnect::driver::{run_connectivity, DriverConfig, GraphInput, Strategy};
use graphconnect::error::{config_error, GcError};
use graphconnect::util::logger::init_logger_with_level;
use log::{info, Level};

arg_enum! {
    #[derive(PartialEq, Debug)]
    pub enum LogLevel {
        Error,
        Warn,
        Info,
        Debug,
        Trace,
    }
}

arg_enum! {
    #[derive(PartialEq, Debug)]
    pub enum InputKind {
        Dbg,
        Kronecker,
        Generic,
        Chain,
    }
}

#[allow(clippy::print_stdout)]
fn main() -> Result<(), GcError> {
    // Parse command line arguments.
    let matches = App::new("graphconnect")
        .about("Computes the connected components of an undirected graph")
        .arg(
            Arg::from_usage("--input=[KIND] 'Graph source'")
                .possible_values(&InputKind::variants())
                .case_insensitive(true)
                .required(true),
        )
        .args_from_usage(
            "--file=[PATH] 'Input file, required for dbg and generic inputs'
             --scale=[N] 'Scale of the Kronecker graph (2^n vertices)'
             --chainLength=[N] 'Node count of the chain input'
             --ranks=[P] 'Number of ranks to run with'
             --maxBfsIterations=[N] 'Upper bound on the number of BFS runs'
             --exportDot=[DIR] 'Write the graph in dot format to this directory'
             --exportBinary=[DIR] 'Write the graph in binary format to this directory'",
        )
        .arg(
            Arg::from_usage("--pointerDouble=[SWITCH] 'Toggle pointer doubling in coloring'")
                .possible_values(&["y", "n"])
                .default_value("y"),
        )
        .arg(
            Arg::from_usage("--strategy=[MODE] 'Force a strategy instead of the selector'")
                .possible_values(&["auto", "coloring", "bfs-coloring", "sequential"])
                .default_value("auto"),
        )
        .arg(
            Arg::from_usage("-l, --loglevel=[LEVEL] 'Set the log level'")
                .possible_values(&LogLevel::variants())
                .case_insensitive(true),
        )
        .get_matches();

    setup_logger(&matches)?;

    let config = build_config(&matches)?;
    let ranks = value_t!(matches, "ranks", usize).unwrap_or(1);
    if ranks == 0 {
        return Err(config_error("--ranks must be at least 1".to_string()));
    }
    if config.strategy == Strategy::Sequential && ranks > 1 {
        return Err(config_error(
            "Run the sequential baseline using a single rank only".to_string(),
        ));
    }
    info!("Starting connectivity benchmark on {} ranks", ranks);

    let counts = gc_comm::execute(ranks, |comm| run_connectivity(&config, comm));
    let component_count =
        counts.into_iter().next().expect("at least one rank result")?;

    // The one line of stdout: the component count, from rank 0.
    println!("{}", component_count);
    Ok(())
}

fn build_config(matches: &ArgMatches) -> Result<DriverConfig, GcError> {
    let input = match value_t!(matches, "input", InputKind).expect("clap validated") {
        InputKind::Kronecker => {
            let scale = value_t!(matches, "scale", u8)
                .map_err(|_| config_error("Required option missing: '--scale'".to_string()))?;
            GraphInput::Kronecker { scale }
        }
        InputKind::Dbg => GraphInput::DeBruijn { file: required_file(matches)? },
        InputKind::Generic => {
            GraphInput::Generic { file: required_file(matches)?, add_reverse: true }
        }
        InputKind::Chain => {
            let length = value_t!(matches, "chainLength", usize).map_err(|_| {
                config_error("Required option missing: '--chainLength'".to_string())
            })?;
            GraphInput::Chain { length }
        }
    };

    let mut config = DriverConfig::new(input);
    config.doubling = if matches.value_of("pointerDouble") == Some("n") {
        Doubling::Off
    } else {
        Doubling::On
    };
    config.strategy = match matches.value_of("strategy") {
        Some("coloring") => Strategy::ColoringOnly,
        Some("bfs-coloring") => Strategy::BfsThenColoring,
        Some("sequential") => Strategy::Sequential,
        _ => Strategy::Auto,
    };
    config.max_bfs_iterations = value_t!(matches, "maxBfsIterations", usize).unwrap_or(1);
    config.export_dot = matches.value_of("exportDot").map(str::to_string);
    config.export_binary = matches.value_of("exportBinary").map(str::to_string);
    Ok(config)
}

fn required_file(matches: &ArgMatches) -> Result<String, GcError> {
    matches
        .value_of("file")
        .map(str::to_string)
        .ok_or_else(|| config_error("Required option missing: '--file'".to_string()))
}

fn setup_logger(matches: &ArgMatches) -> Result<(), GcError> {
    // Set log level.
    let log_level = match value_t!(matches, "loglevel", LogLevel).unwrap_or(LogLevel::Info) {
        LogLevel::Error => Level::Error,
        LogLevel::Warn => Level::Warn,
        LogLevel::Info => Level::Info,
        LogLevel::Debug => Level::Debug,
        LogLevel::Trace => Level::Trace,
    };
    init_logger_with_level(log_level)
}
