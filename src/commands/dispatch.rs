//! Command dispatch logic for skillbench
use std::time::Instant;

use skillbench_core::cancel::CancelToken;
use skillbench_core::config::BenchConfig;
use skillbench_core::error::Result;

use crate::cli::{Cli, Commands};
use crate::commands;

pub fn run(cli: &Cli, cancel: &CancelToken, start: Instant) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => {
            let config = load_config(cli)?;
            tracing::debug!(elapsed = ?start.elapsed(), "load_config");
            commands::run::execute(cli, args, config, cancel.clone())
        }
        Commands::Transcript { file } => commands::transcript::execute(cli, file),
    }
}

/// Explicit `--config` must load; the default file falls back to defaults
fn load_config(cli: &Cli) -> Result<BenchConfig> {
    match &cli.config {
        Some(path) => BenchConfig::load(path),
        None => Ok(BenchConfig::load_or_default()),
    }
}
