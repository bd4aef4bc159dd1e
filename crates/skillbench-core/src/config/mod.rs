//! Benchmark configuration
//!
//! Configuration is read from `skillbench.toml` in the working directory
//! (or an explicit path). Every field has a default, so an empty or missing
//! file yields a usable configuration.

pub mod types;

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::retry::RetryOptions;

pub use types::{
    AgentConfig, BenchConfig, ExecutionConfig, ModelPricingConfig, ModelTier, RetryConfig,
    ScoringConfig,
};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "skillbench.toml";

impl BenchConfig {
    /// Load `skillbench.toml` from the current directory, falling back to defaults
    pub fn load_or_default() -> Self {
        let config_path = Path::new(CONFIG_FILE_NAME);

        if config_path.exists() {
            match Self::load(config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load config file, using defaults");
                }
            }
        }

        Self::default()
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BenchError::failed(&format!("read {}", path.display()), e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: BenchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scorers and scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;
        for (name, value) in [
            ("scoring.pass_threshold", scoring.pass_threshold),
            ("scoring.security_threshold", scoring.security_threshold),
            ("scoring.trigger_threshold", scoring.trigger_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(BenchError::invalid_value(name, value));
            }
        }
        if !(scoring.fuzzy_threshold > 0.0 && scoring.fuzzy_threshold <= 1.0) {
            return Err(BenchError::invalid_value(
                "scoring.fuzzy_threshold",
                scoring.fuzzy_threshold,
            ));
        }
        if self.execution.parallelism == 0 {
            return Err(BenchError::invalid_value("execution.parallelism", 0));
        }
        if self.execution.trigger_timeout_secs == 0 {
            return Err(BenchError::invalid_value("execution.trigger_timeout_secs", 0));
        }
        if self.agent.binary.trim().is_empty() {
            return Err(BenchError::invalid_value("agent.binary", "<empty>"));
        }
        for (tier, pricing) in &self.pricing {
            tier.parse::<ModelTier>()?;
            if pricing.input_per_mtok < 0.0 || pricing.output_per_mtok < 0.0 {
                return Err(BenchError::invalid_value(
                    &format!("pricing.{tier}"),
                    "negative price",
                ));
            }
        }
        Ok(())
    }

    /// Retry options for agent invocations
    pub fn retry_options(&self) -> RetryOptions {
        RetryOptions::new()
            .max_retries(self.retry.max_retries)
            .delay(Duration::from_millis(self.retry.delay_ms))
            .exponential_backoff(self.retry.exponential_backoff)
    }

    /// Timeout used for trigger probe queries
    pub fn trigger_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.trigger_timeout_secs)
    }

    /// Pricing for a model tier, if configured
    pub fn pricing_for(&self, tier: ModelTier) -> Option<ModelPricingConfig> {
        self.pricing.get(tier.as_str()).copied()
    }
}
