use skillbench_core::config::ModelTier;

/// Parse a model tier for clap
pub fn parse_model_tier(s: &str) -> Result<ModelTier, String> {
    s.parse::<ModelTier>().map_err(|e| e.to_string())
}
