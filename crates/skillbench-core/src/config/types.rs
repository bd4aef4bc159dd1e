//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BenchError;

/// Model tier handed to the agent via `--model`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Haiku,
    #[default]
    Sonnet,
    Opus,
}

impl ModelTier {
    pub const ALL: [ModelTier; 3] = [ModelTier::Haiku, ModelTier::Sonnet, ModelTier::Opus];

    /// The cheapest tier, used for trigger probing
    pub fn cheapest() -> Self {
        ModelTier::Haiku
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Haiku => "haiku",
            ModelTier::Sonnet => "sonnet",
            ModelTier::Opus => "opus",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "haiku" => Ok(ModelTier::Haiku),
            "sonnet" => Ok(ModelTier::Sonnet),
            "opus" => Ok(ModelTier::Opus),
            other => Err(BenchError::unsupported(
                "model tier",
                other,
                "haiku, sonnet, opus",
            )),
        }
    }
}

/// Top-level benchmark configuration (`skillbench.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Per-tier pricing used when a transcript carries no cost, keyed by tier name
    #[serde(default = "default_pricing")]
    pub pricing: HashMap<String, ModelPricingConfig>,
}

/// How the external agent is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent executable name or path
    #[serde(default = "default_agent_binary")]
    pub binary: String,

    /// Extra arguments appended before the prompt
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Retain each raw event stream under this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_dir: Option<PathBuf>,
}

/// Thresholds and matching knobs for the scorers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum concept accuracy (0-100) for knowledge/task tests to pass
    #[serde(default = "default_threshold")]
    pub pass_threshold: f64,

    /// Minimum security score (0-100) for security tests to pass
    #[serde(default = "default_threshold")]
    pub security_threshold: f64,

    /// Minimum trigger score (0-100) for trigger tests to pass
    #[serde(default = "default_threshold")]
    pub trigger_threshold: f64,

    /// Fraction of significant words that must appear for a fuzzy match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    #[serde(default)]
    pub case_sensitive: bool,

    /// Allow fuzzy matching of concept patterns (security refusals always fuzzy)
    #[serde(default = "default_true")]
    pub fuzzy_concepts: bool,
}

/// Retry/degrade settings for agent invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default)]
    pub exponential_backoff: bool,
}

/// Scheduling of the test matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum concurrent agent invocations within a run (1 = sequential)
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Timeout for each trigger probe query
    #[serde(default = "default_trigger_timeout_secs")]
    pub trigger_timeout_secs: u64,
}

/// USD pricing per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricingConfig {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            scoring: ScoringConfig::default(),
            retry: RetryConfig::default(),
            execution: ExecutionConfig::default(),
            pricing: default_pricing(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: default_agent_binary(),
            extra_args: Vec::new(),
            transcript_dir: None,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_threshold: default_threshold(),
            security_threshold: default_threshold(),
            trigger_threshold: default_threshold(),
            fuzzy_threshold: default_fuzzy_threshold(),
            case_sensitive: false,
            fuzzy_concepts: true,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
            exponential_backoff: false,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            trigger_timeout_secs: default_trigger_timeout_secs(),
        }
    }
}

fn default_agent_binary() -> String {
    "claude".to_string()
}

fn default_threshold() -> f64 {
    70.0
}

fn default_fuzzy_threshold() -> f64 {
    0.8
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    1
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_parallelism() -> usize {
    1
}

fn default_trigger_timeout_secs() -> u64 {
    60
}

fn default_pricing() -> HashMap<String, ModelPricingConfig> {
    HashMap::from([
        (
            ModelTier::Haiku.to_string(),
            ModelPricingConfig {
                input_per_mtok: 0.8,
                output_per_mtok: 4.0,
            },
        ),
        (
            ModelTier::Sonnet.to_string(),
            ModelPricingConfig {
                input_per_mtok: 3.0,
                output_per_mtok: 15.0,
            },
        ),
        (
            ModelTier::Opus.to_string(),
            ModelPricingConfig {
                input_per_mtok: 15.0,
                output_per_mtok: 75.0,
            },
        ),
    ])
}
