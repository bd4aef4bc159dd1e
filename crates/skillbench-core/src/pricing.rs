//! Cost estimation from per-tier token pricing

use crate::config::ModelPricingConfig;

const TOKENS_PER_MTOK: f64 = 1_000_000.0;

/// Estimated USD cost of an invocation
pub fn estimate_cost(pricing: ModelPricingConfig, input_tokens: u64, output_tokens: u64) -> f64 {
    (input_tokens as f64 / TOKENS_PER_MTOK) * pricing.input_per_mtok
        + (output_tokens as f64 / TOKENS_PER_MTOK) * pricing.output_per_mtok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BenchConfig, ModelTier};

    #[test]
    fn test_estimate_cost_sonnet() {
        let pricing = BenchConfig::default()
            .pricing_for(ModelTier::Sonnet)
            .unwrap();
        let cost = estimate_cost(pricing, 1_000_000, 100_000);
        assert!((cost - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_cost_zero_tokens() {
        let pricing = ModelPricingConfig {
            input_per_mtok: 3.0,
            output_per_mtok: 15.0,
        };
        assert_eq!(estimate_cost(pricing, 0, 0), 0.0);
    }

    #[test]
    fn test_haiku_cheaper_than_opus() {
        let config = BenchConfig::default();
        let haiku = estimate_cost(config.pricing_for(ModelTier::Haiku).unwrap(), 5000, 500);
        let opus = estimate_cost(config.pricing_for(ModelTier::Opus).unwrap(), 5000, 500);
        assert!(haiku < opus);
    }
}
