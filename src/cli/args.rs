use super::parse::parse_model_tier;
use clap::Args;
use skillbench_core::config::ModelTier;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Skill directory under test
    #[arg(long, short)]
    pub skill: PathBuf,

    /// YAML test suite
    #[arg(long, short)]
    pub tests: PathBuf,

    /// Model tier (haiku, sonnet, opus)
    #[arg(long, short, default_value = "sonnet", value_parser = parse_model_tier)]
    pub model: ModelTier,

    /// Number of times to run the whole suite
    #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    /// Maximum concurrent agent invocations (overrides config)
    #[arg(long, short, value_parser = clap::value_parser!(u64).range(1..))]
    pub parallel: Option<u64>,

    /// Write the JSON result to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Agent binary (overrides config)
    #[arg(long, env = "SKILLBENCH_AGENT_BIN")]
    pub agent_bin: Option<String>,

    /// Directory the agent runs in (default: current directory)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Retain raw agent transcripts in this directory (overrides config)
    #[arg(long)]
    pub transcript_dir: Option<PathBuf>,
}
