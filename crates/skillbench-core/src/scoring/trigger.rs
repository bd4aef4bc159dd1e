//! Trigger activation: does the skill engage on relevant queries and stay
//! silent on irrelevant ones
//!
//! A query counts as "activated" when its execution succeeded and made at
//! least one tool call.

use std::path::Path;
use std::time::Duration;

use super::{new_result, percentage};
use crate::cancel::CancelToken;
use crate::config::{BenchConfig, ModelTier};
use crate::definition::TestDefinition;
use crate::execution::{execute_with_retry, AgentExecutor, ExecutionRequest};
use crate::results::{Activation, BenchmarkMetrics, Expectation, QueryResult, TestResult, TriggerScore};
use crate::retry::RetryOptions;

/// Default timeout for each probe query
pub const DEFAULT_TRIGGER_TIMEOUT: Duration = Duration::from_secs(60);

/// `trigger_rate × (1 − false_positive_rate / 100)`
pub fn trigger_score(trigger_rate: f64, false_positive_rate: f64) -> f64 {
    trigger_rate * (1.0 - false_positive_rate / 100.0)
}

/// Rates and score for a set of classified queries
pub fn compute_trigger_score(query_results: Vec<QueryResult>) -> TriggerScore {
    let count = |expected: Expectation, correct: bool| {
        query_results
            .iter()
            .filter(|q| q.expected == expected && q.correct == correct)
            .count()
    };
    let positives = query_results
        .iter()
        .filter(|q| q.expected == Expectation::Activate)
        .count();
    let negatives = query_results.len() - positives;

    let trigger_rate = percentage(count(Expectation::Activate, true), positives, 0.0);
    let false_positive_rate = percentage(count(Expectation::Ignore, false), negatives, 0.0);

    TriggerScore {
        trigger_rate,
        false_positive_rate,
        trigger_score: trigger_score(trigger_rate, false_positive_rate),
        query_results,
    }
}

/// Average trigger scores over several runs.
///
/// Rates are averaged first and the score recomputed from the averages.
/// The first run's query results are kept as representative detail.
/// `None` for no input.
pub fn aggregate_trigger_scores(scores: &[TriggerScore]) -> Option<TriggerScore> {
    let first = scores.first()?;
    let n = scores.len() as f64;
    let trigger_rate = scores.iter().map(|s| s.trigger_rate).sum::<f64>() / n;
    let false_positive_rate = scores.iter().map(|s| s.false_positive_rate).sum::<f64>() / n;

    Some(TriggerScore {
        trigger_rate,
        false_positive_rate,
        trigger_score: trigger_score(trigger_rate, false_positive_rate),
        query_results: first.query_results.clone(),
    })
}

/// Where and under what label probe queries run
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext<'a> {
    pub skill_path: &'a Path,
    pub work_dir: &'a Path,
    /// Prefix for per-query execution labels
    pub label: &'a str,
}

/// Runs a trigger test's probe queries on the cheapest model tier
pub struct TriggerScorer<'a> {
    executor: &'a dyn AgentExecutor,
    retry: RetryOptions,
    timeout: Duration,
    threshold: f64,
    cancel: CancelToken,
}

impl<'a> TriggerScorer<'a> {
    pub fn new(executor: &'a dyn AgentExecutor, cancel: CancelToken) -> Self {
        Self {
            executor,
            retry: RetryOptions::new().cancel_token(cancel.clone()),
            timeout: DEFAULT_TRIGGER_TIMEOUT,
            threshold: 70.0,
            cancel,
        }
    }

    pub fn from_config(
        executor: &'a dyn AgentExecutor,
        config: &BenchConfig,
        cancel: CancelToken,
    ) -> Self {
        Self::new(executor, cancel.clone())
            .with_retry(config.retry_options().cancel_token(cancel))
            .with_timeout(config.trigger_timeout())
            .with_threshold(config.scoring.trigger_threshold)
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Probe every positive and negative query and score the test
    pub fn score(&self, test: &TestDefinition, context: ProbeContext<'_>) -> TestResult {
        let queries = test
            .positive_triggers
            .iter()
            .map(|q| (q, Expectation::Activate, "pos"))
            .chain(
                test.negative_triggers
                    .iter()
                    .map(|q| (q, Expectation::Ignore, "neg")),
            );

        let mut totals = BenchmarkMetrics::default();
        let mut query_results = Vec::new();
        for (index, (query, expected, kind)) in queries.enumerate() {
            let label = format!("{}-{}{}", context.label, kind, index + 1);
            let (query_result, metrics) = self.probe(query, expected, &label, context);
            accumulate(&mut totals, &metrics);
            query_results.push(query_result);
        }

        let score = compute_trigger_score(query_results);
        tracing::debug!(
            test = %test.name,
            trigger_rate = score.trigger_rate,
            false_positive_rate = score.false_positive_rate,
            score = score.trigger_score,
            "scored trigger test"
        );

        let correct = score.query_results.iter().filter(|q| q.correct).count();
        let summary = format!("{}/{} queries classified correctly", correct, score.query_results.len());
        let mut result = new_result(test, &totals, &summary);
        result.metrics.accuracy = score.trigger_score;
        result.passed = score.trigger_score >= self.threshold;
        for query in &score.query_results {
            if query.correct {
                result.matched_concepts.push(query.query.clone());
            } else {
                result.missed_concepts.push(query.query.clone());
            }
        }
        result.trigger = Some(score);
        result
    }

    fn probe(
        &self,
        query: &str,
        expected: Expectation,
        label: &str,
        context: ProbeContext<'_>,
    ) -> (QueryResult, BenchmarkMetrics) {
        let request = ExecutionRequest {
            label: label.to_string(),
            prompt: query.to_string(),
            model: ModelTier::cheapest(),
            skill_path: context.skill_path.to_path_buf(),
            work_dir: context.work_dir.to_path_buf(),
            timeout: self.timeout,
        };
        let execution = execute_with_retry(self.executor, &request, &self.retry, &self.cancel);

        let activated = execution.success && execution.metrics.tool_count > 0;
        let correct = match expected {
            Expectation::Activate => activated,
            Expectation::Ignore => !activated,
        };
        let query_result = QueryResult {
            query: query.to_string(),
            expected,
            actual: if activated {
                Activation::Activated
            } else {
                Activation::Ignored
            },
            correct,
            tool_count: execution.metrics.tool_count,
        };
        (query_result, execution.metrics)
    }
}

fn accumulate(totals: &mut BenchmarkMetrics, metrics: &BenchmarkMetrics) {
    totals.tokens_input += metrics.tokens_input;
    totals.tokens_output += metrics.tokens_output;
    totals.tokens_total += metrics.tokens_total;
    totals.duration_ms += metrics.duration_ms;
    totals.tool_count += metrics.tool_count;
    totals.cost_usd += metrics.cost_usd;
}
