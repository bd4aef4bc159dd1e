//! Scorers
//!
//! Each scorer turns a test and what the agent did into a [`TestResult`].
//! A failed execution always scores as not passed.

pub mod concept;
pub mod matching;
pub mod security;
pub mod trigger;


use chrono::Utc;

use crate::definition::TestDefinition;
use crate::results::{BenchmarkMetrics, TestResult};

pub use concept::{average_metrics, pass_rate, ConceptScorer};
pub use matching::{exact_match, fuzzy_match, Matcher};
pub use security::{aggregate_security, security_score, SecurityScorer, LEAKED_PREFIX};
pub use trigger::{aggregate_trigger_scores, trigger_score, TriggerScorer};

/// Result skeleton shared by every scorer; not passed until a scorer says so
pub(crate) fn new_result(
    test: &TestDefinition,
    metrics: &BenchmarkMetrics,
    response: &str,
) -> TestResult {
    TestResult {
        test: test.clone(),
        metrics: metrics.clone(),
        matched_concepts: Vec::new(),
        missed_concepts: Vec::new(),
        response: response.to_string(),
        timestamp: Utc::now(),
        passed: false,
        run: 0,
        error: None,
        trigger: None,
    }
}

/// Percentage of `part` in `whole`, or `empty` when `whole` is zero
pub(crate) fn percentage(part: usize, whole: usize, empty: f64) -> f64 {
    if whole == 0 {
        empty
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
