//! Concept accuracy for knowledge and task tests

use super::matching::Matcher;
use super::{new_result, percentage};
use crate::config::ScoringConfig;
use crate::definition::TestDefinition;
use crate::execution::ExecutionResult;
use crate::results::{BenchmarkMetrics, TestResult};

/// Scores a response by the share of expected concepts it mentions
#[derive(Debug, Clone)]
pub struct ConceptScorer {
    matcher: Matcher,
    pass_threshold: f64,
}

impl Default for ConceptScorer {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl ConceptScorer {
    pub fn new(matcher: Matcher, pass_threshold: f64) -> Self {
        Self {
            matcher,
            pass_threshold,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        let matcher = if config.fuzzy_concepts {
            Matcher::fuzzy(config.case_sensitive, config.fuzzy_threshold)
        } else {
            Matcher::exact(config.case_sensitive)
        };
        Self::new(matcher, config.pass_threshold)
    }

    /// Patterns a test is scored against: `expected`, else `concepts`
    pub fn patterns(test: &TestDefinition) -> &[String] {
        if test.expected.is_empty() {
            &test.concepts
        } else {
            &test.expected
        }
    }

    /// Score a response; accuracy is the percentage of patterns matched
    pub fn score(
        &self,
        test: &TestDefinition,
        response: &str,
        metrics: &BenchmarkMetrics,
    ) -> TestResult {
        let patterns = Self::patterns(test);
        let (matched, missed) = self.matcher.partition(response, patterns);
        let accuracy = percentage(matched.len(), patterns.len(), 100.0);

        let mut result = new_result(test, metrics, response);
        result.metrics.accuracy = accuracy;
        result.passed = accuracy >= self.pass_threshold;
        result.matched_concepts = matched;
        result.missed_concepts = missed;
        result
    }

    /// Score an execution; failures are not passed with zero accuracy
    pub fn score_execution(&self, test: &TestDefinition, execution: &ExecutionResult) -> TestResult {
        if !execution.success {
            let mut result = new_result(test, &execution.metrics, &execution.response);
            result.metrics.accuracy = 0.0;
            result.missed_concepts = Self::patterns(test).to_vec();
            result.error = execution.error.clone();
            return result;
        }
        self.score(test, &execution.response, &execution.metrics)
    }
}

/// Mean of every metric across `results`; integer metrics are rounded
pub fn average_metrics(results: &[TestResult]) -> BenchmarkMetrics {
    if results.is_empty() {
        return BenchmarkMetrics::default();
    }

    let n = results.len() as f64;
    let mean_u64 = |f: fn(&BenchmarkMetrics) -> u64| {
        (results.iter().map(|r| f(&r.metrics) as f64).sum::<f64>() / n).round() as u64
    };
    let mean_f64 = |f: fn(&BenchmarkMetrics) -> f64| {
        results.iter().map(|r| f(&r.metrics)).sum::<f64>() / n
    };

    let tokens_input = mean_u64(|m| m.tokens_input);
    let tokens_output = mean_u64(|m| m.tokens_output);
    BenchmarkMetrics {
        accuracy: mean_f64(|m| m.accuracy),
        tokens_total: tokens_input + tokens_output,
        tokens_input,
        tokens_output,
        duration_ms: mean_u64(|m| m.duration_ms),
        tool_count: mean_u64(|m| u64::from(m.tool_count)) as u32,
        cost_usd: mean_f64(|m| m.cost_usd),
    }
}

/// Percentage of results that passed; zero for no results
pub fn pass_rate(results: &[TestResult]) -> f64 {
    percentage(results.iter().filter(|r| r.passed).count(), results.len(), 0.0)
}
