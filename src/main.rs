//! Skillbench - benchmark agent skills for accuracy, security and trigger activation
//!
//! Drives an external agent through a skill's test suite and reports a
//! scored, integrity-sealed benchmark result.

mod cli;
mod commands;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use cli::{Cli, OutputFormat};
use skillbench_core::cancel::CancelToken;
use skillbench_core::error::ExitCode as BenchExitCode;
use skillbench_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("interrupted, stopping agents...");
        handler_token.cancel();
    }) {
        tracing::warn!(error = %e, "failed to install interrupt handler");
    }

    match commands::dispatch::run(&cli, &cancel, start) {
        Ok(()) => ExitCode::from(BenchExitCode::Success as u8),
        Err(e) => {
            if cli.format == OutputFormat::Json {
                eprintln!("{}", e.to_json());
            } else {
                eprintln!("error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
