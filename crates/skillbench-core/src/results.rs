//! Result types produced by the scorers and the aggregator
//!
//! Field names serialize in camelCase to match the persisted result shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::config::ModelTier;
use crate::definition::TestDefinition;
use crate::error::Result;

/// Primitive metrics of one invocation, or an average over many
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkMetrics {
    /// 0-100; zero until a scorer fills it in
    pub accuracy: f64,
    pub tokens_total: u64,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub duration_ms: u64,
    pub tool_count: u32,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test: TestDefinition,
    pub metrics: BenchmarkMetrics,
    pub matched_concepts: Vec<String>,
    pub missed_concepts: Vec<String>,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub passed: bool,

    /// 1-based run this result belongs to
    #[serde(default)]
    pub run: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Per-query detail for trigger tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerScore>,
}

/// Rates for one security category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub refusal_rate: f64,
    pub leakage_rate: f64,
    pub tests_run: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScore {
    pub refusal_rate: f64,
    pub leakage_rate: f64,
    pub security_score: f64,
    pub category_breakdown: BTreeMap<String, CategoryScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Activate,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Activated,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query: String,
    pub expected: Expectation,
    pub actual: Activation,
    pub correct: bool,
    pub tool_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerScore {
    pub trigger_rate: f64,
    pub false_positive_rate: f64,
    pub trigger_score: f64,
    pub query_results: Vec<QueryResult>,
}

/// Identity of the skill under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillIdentity {
    pub name: String,
    pub path: String,
}

/// Aggregates for a single run of the test matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run: u32,
    pub metrics: BenchmarkMetrics,
    pub pass_rate: f64,
    pub tests_run: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub skill: SkillIdentity,
    pub model: ModelTier,
    pub runs: u32,
    pub results: Vec<TestResult>,
    pub metrics: BenchmarkMetrics,
    pub pass_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerScore>,
    pub run_summaries: Vec<RunSummary>,
    pub timestamp: DateTime<Utc>,
    pub tool_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_hash: Option<String>,
}

impl BenchmarkResult {
    /// SHA-256 (hex) over the JSON serialization with the hash field cleared
    pub fn compute_hash(&self) -> Result<String> {
        let mut unsealed = self.clone();
        unsealed.integrity_hash = None;
        let bytes = serde_json::to_vec(&unsealed)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Attach the integrity hash
    pub fn seal(mut self) -> Result<Self> {
        self.integrity_hash = Some(self.compute_hash()?);
        Ok(self)
    }

    /// True when the stored hash matches the content
    pub fn verify(&self) -> Result<bool> {
        match &self.integrity_hash {
            Some(hash) => Ok(*hash == self.compute_hash()?),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TestType;

    fn sample() -> BenchmarkResult {
        let test = TestDefinition::new("basics", TestType::Knowledge, "What is it?");
        let metrics = BenchmarkMetrics {
            accuracy: 100.0,
            tokens_total: 30,
            tokens_input: 10,
            tokens_output: 20,
            duration_ms: 1500,
            tool_count: 1,
            cost_usd: 0.002,
        };
        BenchmarkResult {
            skill: SkillIdentity {
                name: "calendar".into(),
                path: "/skills/calendar".into(),
            },
            model: ModelTier::Sonnet,
            runs: 1,
            results: vec![TestResult {
                test,
                metrics: metrics.clone(),
                matched_concepts: vec!["calendar".into()],
                missed_concepts: Vec::new(),
                response: "A calendar skill".into(),
                timestamp: Utc::now(),
                passed: true,
                run: 1,
                error: None,
                trigger: None,
            }],
            metrics,
            pass_rate: 100.0,
            security: None,
            trigger: None,
            run_summaries: Vec::new(),
            timestamp: Utc::now(),
            tool_version: "0.1.0".into(),
            integrity_hash: None,
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["metrics"]["tokensTotal"], 30);
        assert_eq!(json["metrics"]["costUsd"], 0.002);
        assert_eq!(json["passRate"], 100.0);
        assert_eq!(json["model"], "sonnet");
        assert_eq!(json["results"][0]["matchedConcepts"][0], "calendar");
        assert_eq!(json["results"][0]["test"]["type"], "knowledge");
        assert!(json.get("integrityHash").is_none());
        assert!(json.get("security").is_none());
    }

    #[test]
    fn test_seal_and_verify() {
        let sealed = sample().seal().unwrap();
        let hash = sealed.integrity_hash.clone().unwrap();
        assert_eq!(hash.len(), 64);
        assert!(sealed.verify().unwrap());

        let mut tampered = sealed.clone();
        tampered.pass_rate = 0.0;
        assert!(!tampered.verify().unwrap());

        assert!(!sample().verify().unwrap());
    }

    #[test]
    fn test_round_trips_through_json() {
        let sealed = sample().seal().unwrap();
        let json = serde_json::to_string(&sealed).unwrap();
        let back: BenchmarkResult = serde_json::from_str(&json).unwrap();
        assert!(back.verify().unwrap());
    }
}
