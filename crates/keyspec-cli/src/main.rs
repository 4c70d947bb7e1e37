//! # keyspec CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use keyspec_cli::check::{run_check_schema, CheckSchemaArgs};
use keyspec_cli::config::resolve_options;
use keyspec_cli::validate::{run_validate, ValidateArgs};
use keyspec_cli::EXIT_ERROR;

/// Validate nested configuration documents against key schemas.
#[derive(Parser, Debug)]
#[command(name = "keyspec", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a validator configuration file (JSON or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate data documents against a schema.
    Validate(ValidateArgs),

    /// Load a schema and report lint findings.
    CheckSchema(CheckSchemaArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "keyspec CLI starting");

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Validate(args) => {
            resolve_options(config, args.continue_siblings).and_then(|options| run_validate(args, options))
        }
        Commands::CheckSchema(args) => resolve_options(config, args.continue_siblings)
            .and_then(|options| run_check_schema(args, options)),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
