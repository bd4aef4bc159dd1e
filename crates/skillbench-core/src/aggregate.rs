//! Fold per-test results into run-level and skill-level summaries

use chrono::Utc;

use crate::config::ModelTier;
use crate::definition::TestType;
use crate::error::Result;
use crate::results::{BenchmarkResult, RunSummary, SkillIdentity, TestResult, TriggerScore};
use crate::scoring::concept::{average_metrics, pass_rate};
use crate::scoring::security::aggregate_security;
use crate::scoring::trigger::{aggregate_trigger_scores, compute_trigger_score};

/// Tool version stamped on every result
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Trigger score over every trigger query in one run's results
pub fn run_trigger_score(results: &[TestResult]) -> Option<TriggerScore> {
    let query_results: Vec<_> = results
        .iter()
        .filter(|r| r.test.test_type == TestType::Trigger)
        .filter_map(|r| r.trigger.as_ref())
        .flat_map(|t| t.query_results.iter().cloned())
        .collect();

    if query_results.is_empty() {
        None
    } else {
        Some(compute_trigger_score(query_results))
    }
}

/// Summary of the results belonging to `run`
pub fn summarize_run(run: u32, results: &[TestResult]) -> RunSummary {
    let run_results: Vec<TestResult> = results.iter().filter(|r| r.run == run).cloned().collect();
    RunSummary {
        run,
        metrics: average_metrics(&run_results),
        pass_rate: pass_rate(&run_results),
        tests_run: run_results.len(),
        security: aggregate_security(&run_results),
        trigger: run_trigger_score(&run_results),
    }
}

/// Build the sealed skill-level result from every run's results.
///
/// Security is aggregated over all security results at once; trigger
/// scores are computed per run and then averaged across runs.
pub fn build_result(
    skill: SkillIdentity,
    model: ModelTier,
    runs: u32,
    results: Vec<TestResult>,
) -> Result<BenchmarkResult> {
    let run_summaries: Vec<RunSummary> = (1..=runs).map(|run| summarize_run(run, &results)).collect();
    let trigger_scores: Vec<TriggerScore> = run_summaries
        .iter()
        .filter_map(|summary| summary.trigger.clone())
        .collect();

    for summary in &run_summaries {
        tracing::info!(
            run = summary.run,
            tests = summary.tests_run,
            pass_rate = summary.pass_rate,
            "run complete"
        );
    }

    let result = BenchmarkResult {
        skill,
        model,
        runs,
        metrics: average_metrics(&results),
        pass_rate: pass_rate(&results),
        security: aggregate_security(&results),
        trigger: aggregate_trigger_scores(&trigger_scores),
        run_summaries,
        results,
        timestamp: Utc::now(),
        tool_version: TOOL_VERSION.to_string(),
        integrity_hash: None,
    };
    result.seal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TestDefinition;
    use crate::results::{Activation, BenchmarkMetrics, Expectation, QueryResult};
    use crate::scoring::{ConceptScorer, SecurityScorer};

    fn identity() -> SkillIdentity {
        SkillIdentity {
            name: "calendar".into(),
            path: "/skills/calendar".into(),
        }
    }

    fn with_run(mut result: TestResult, run: u32) -> TestResult {
        result.run = run;
        result
    }

    fn trigger_result(run: u32, correct: bool) -> TestResult {
        let mut test = TestDefinition::new("activation", TestType::Trigger, "p");
        test.positive_triggers = vec!["book".into()];
        let mut result = ConceptScorer::default().score(&test, "", &BenchmarkMetrics::default());
        result.run = run;
        result.passed = correct;
        result.trigger = Some(compute_trigger_score(vec![QueryResult {
            query: "book".into(),
            expected: Expectation::Activate,
            actual: if correct {
                Activation::Activated
            } else {
                Activation::Ignored
            },
            correct,
            tool_count: u32::from(correct),
        }]));
        result
    }

    #[test]
    fn test_build_result_summaries_and_seal() {
        let mut knowledge = TestDefinition::new("k", TestType::Knowledge, "p");
        knowledge.expected = vec!["alpha".into()];
        let mut security = TestDefinition::new("s", TestType::Security, "p");
        security.expected = vec!["cannot".into()];

        let concept = ConceptScorer::default();
        let results = vec![
            with_run(concept.score(&knowledge, "alpha", &BenchmarkMetrics::default()), 1),
            with_run(
                SecurityScorer::default().score(&security, "I cannot", &BenchmarkMetrics::default()),
                1,
            ),
            with_run(concept.score(&knowledge, "beta", &BenchmarkMetrics::default()), 2),
            trigger_result(1, true),
            trigger_result(2, false),
        ];

        let result = build_result(identity(), ModelTier::Sonnet, 2, results).unwrap();

        assert_eq!(result.results.len(), 5);
        assert_eq!(result.run_summaries.len(), 2);
        assert_eq!(result.run_summaries[0].tests_run, 3);
        assert_eq!(result.run_summaries[0].pass_rate, 100.0);
        assert_eq!(result.run_summaries[1].pass_rate, 0.0);
        assert!(result.run_summaries[1].security.is_none());
        assert_eq!(result.pass_rate, 60.0);
        assert_eq!(result.security.as_ref().unwrap().security_score, 100.0);

        let trigger = result.trigger.as_ref().unwrap();
        assert_eq!(trigger.trigger_rate, 50.0);
        assert_eq!(trigger.trigger_score, 50.0);

        assert_eq!(result.tool_version, TOOL_VERSION);
        assert!(result.verify().unwrap());
    }

    #[test]
    fn test_no_trigger_tests_no_trigger_score() {
        let test = TestDefinition::new("k", TestType::Knowledge, "p");
        let results = vec![with_run(
            ConceptScorer::default().score(&test, "x", &BenchmarkMetrics::default()),
            1,
        )];
        let result = build_result(identity(), ModelTier::Haiku, 1, results).unwrap();
        assert!(result.trigger.is_none());
        assert!(result.security.is_none());
    }
}
