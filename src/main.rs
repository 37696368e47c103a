//! PlantVillage inference CLI
//!
//! Called by the web backend as a subprocess: `plantvillage_infer <model> <image>`.
//! Prints exactly one JSON line to stdout and exits 0 on success, 1 on failure.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;

use plantvillage_infer::utils::logging::{init_logging, LogConfig, LogLevel};
use plantvillage_infer::{
    emit, select_engine, InferenceConfig, Invocation, PlantVillageError, Reporter, Response,
};

/// PlantVillage plant disease classification
///
/// Classifies a single leaf image with a TFLite model and prints the top-5
/// predictions as JSON.
#[derive(Parser, Debug)]
#[command(name = "plantvillage_infer")]
#[command(author = "Warre Snaet")]
#[command(version)]
#[command(about = "Classify a plant leaf image with a TFLite model", long_about = None)]
struct Cli {
    /// Path to the .tflite model
    model_path: Option<PathBuf>,

    /// Path to the leaf image
    image_path: Option<PathBuf>,

    /// Ignored extra positional arguments
    #[arg(hide = true)]
    extra: Vec<String>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging on stderr
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Log level on stderr (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let response = respond(std::env::args_os().collect());

    match write_response(&response) {
        Ok(()) => ExitCode::from(response.exit_code()),
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Turn the raw argument vector into the single response of this process
fn respond(args: Vec<OsString>) -> Response {
    // Fewer than two arguments is always the missing-arguments response, flags included
    if args.len() < 3 {
        return Response::from_error(&PlantVillageError::MissingArguments);
    }

    match Cli::try_parse_from(args) {
        Ok(cli) => run(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => Response::from_error(&PlantVillageError::InvalidArguments(clap_message(&e))),
    }
}

/// First line of a clap error without its `error: ` prefix
fn clap_message(e: &clap::Error) -> String {
    let text = e.to_string();
    let line = text.lines().next().unwrap_or_default();
    line.trim_start_matches("error: ").to_string()
}

fn run(cli: Cli) -> Response {
    // Arguments are checked before any file is opened
    let invocation = match Invocation::from_args(cli.model_path, cli.image_path) {
        Ok(invocation) => invocation,
        Err(e) => return Response::from_error(&e),
    };

    let config = match InferenceConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return Response::from_error(&e),
    };

    let level = match (cli.verbose, cli.log_level.as_deref()) {
        (true, _) => LogLevel::Debug,
        (false, Some(level)) => LogLevel::from_str(level),
        (false, None) => config.log_level,
    };
    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default().with_level(level)
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{}", e);
    }

    debug!(
        "Classifying {} with {}",
        invocation.image_path.display(),
        invocation.model_path.display()
    );

    let taxonomy = match config.taxonomy() {
        Ok(taxonomy) => taxonomy,
        Err(e) => return Response::from_error(&e),
    };

    let engine = select_engine(&config);
    Reporter::new(engine.as_ref(), &taxonomy).run(&invocation)
}

fn write_response(response: &Response) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    emit(response, &mut out).context("Failed to write response to stdout")
}
