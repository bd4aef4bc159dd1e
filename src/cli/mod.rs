//! CLI argument parsing for skillbench

pub mod args;
pub mod output;
pub mod parse;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::RunArgs;
pub use output::OutputFormat;

/// Skillbench - benchmark agent skills
#[derive(Parser, Debug)]
#[command(name = "skillbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ./skillbench.toml if present)
    #[arg(long, global = true, env = "SKILLBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace) or a filter directive
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a skill's test suite against the agent
    Run(RunArgs),

    /// Parse a retained agent transcript and report what it contains
    Transcript {
        /// Path to a newline-delimited JSON event stream
        file: PathBuf,
    },
}
