//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, discovers configuration, creates the tokio
//! runtime, dispatches to a command and handles all error output.

use clap::Parser;
use tracing::debug;

use circbench_config::Config;
use circbench_utils::error::BenchError;
use circbench_utils::exit_codes::ExitCode;
use circbench_utils::logging::init_tracing;

use crate::args::{Cli, Commands};
use crate::commands;

/// Main CLI execution function.
///
/// Prints everything itself, including errors. main.rs only maps the
/// returned code to the process exit status.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging unavailable: {e}");
    }

    let config = match Config::discover(&cli.to_cli_args()) {
        Ok(config) => config,
        Err(err) => {
            let err = BenchError::Config(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };
    debug!(operation = cli.operation(), "Configuration loaded");

    match cli.command {
        Commands::Run { .. } => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("✗ Failed to create async runtime: {e}");
                    return Err(ExitCode::INTERNAL);
                }
            };
            match rt.block_on(commands::execute_run_command(config)) {
                Ok(()) => Ok(()),
                Err(err) => {
                    eprintln!("{}", err.display_for_user());
                    Err(err.to_exit_code())
                }
            }
        }
        Commands::Status { json } => {
            report(commands::execute_status_command(json, &config), "status")
        }
        Commands::Config { json } => {
            report(commands::execute_config_command(json, &config), "config")
        }
        Commands::Doctor { json, strict } => {
            match commands::execute_doctor_command(json, strict, &config) {
                Ok(true) => Ok(()),
                Ok(false) => Err(ExitCode::INTERNAL),
                Err(e) => report(Err(e), "doctor"),
            }
        }
    }
}

fn report(result: anyhow::Result<()>, operation: &str) -> Result<(), ExitCode> {
    result.map_err(|e| {
        eprintln!("✗ {operation} failed: {e:#}");
        ExitCode::INTERNAL
    })
}
