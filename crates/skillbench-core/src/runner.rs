//! Run a skill's test matrix: execute, score and aggregate
//!
//! A single test's failure never aborts the run; only an empty suite or a
//! cancelled run is an error.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use crate::aggregate::build_result;
use crate::cancel::CancelToken;
use crate::config::{BenchConfig, ModelTier};
use crate::definition::{TestDefinition, TestType};
use crate::error::{BenchError, Result};
use crate::execution::{execute_with_retry, AgentExecutor, ExecutionRequest, ExecutionResult};
use crate::results::{BenchmarkResult, SkillIdentity, TestResult};
use crate::scoring::trigger::{ProbeContext, TriggerScorer};
use crate::scoring::{ConceptScorer, SecurityScorer};
use crate::trace_time;

/// A resolved skill directory and where the agent should run
#[derive(Debug, Clone, PartialEq)]
pub struct SkillContext {
    pub name: String,
    pub path: PathBuf,
    pub work_dir: PathBuf,
}

impl SkillContext {
    /// Context for an existing skill directory, named after the directory
    pub fn from_dir(path: &Path, work_dir: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(BenchError::SkillNotFound {
                path: path.to_path_buf(),
            });
        }
        let path = path.canonicalize()?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "skill".to_string());
        Ok(Self {
            name,
            path,
            work_dir: work_dir.to_path_buf(),
        })
    }

    pub fn identity(&self) -> SkillIdentity {
        SkillIdentity {
            name: self.name.clone(),
            path: self.path.display().to_string(),
        }
    }
}

pub struct BenchmarkRunner {
    executor: Arc<dyn AgentExecutor>,
    config: BenchConfig,
    cancel: CancelToken,
}

impl BenchmarkRunner {
    pub fn new(executor: Arc<dyn AgentExecutor>, config: BenchConfig) -> Self {
        Self {
            executor,
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this runner's in-flight and pending work
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run every test `runs` times and aggregate the results
    pub fn run(
        &self,
        skill: &SkillContext,
        tests: &[TestDefinition],
        model: ModelTier,
        runs: u32,
    ) -> Result<BenchmarkResult> {
        if tests.is_empty() {
            return Err(BenchError::NoTests);
        }
        if runs == 0 {
            return Err(BenchError::invalid_value("runs", 0));
        }

        let start = Instant::now();
        tracing::info!(
            skill = %skill.name,
            tests = tests.len(),
            runs,
            model = %model,
            executor = self.executor.name(),
            parallelism = self.config.execution.parallelism,
            "starting benchmark"
        );

        let mut results = Vec::with_capacity(tests.len() * runs as usize);
        for run in 1..=runs {
            if self.cancel.is_cancelled() {
                return Err(BenchError::Cancelled);
            }
            results.extend(self.run_once(skill, tests, model, run));
        }
        if self.cancel.is_cancelled() {
            return Err(BenchError::Cancelled);
        }

        let result = build_result(skill.identity(), model, runs, results)?;
        trace_time!(start, "benchmark_run", tests = tests.len());
        Ok(result)
    }

    /// One pass over the suite; results keep suite order
    pub fn run_once(
        &self,
        skill: &SkillContext,
        tests: &[TestDefinition],
        model: ModelTier,
        run: u32,
    ) -> Vec<TestResult> {
        let workers = self.config.execution.parallelism.clamp(1, tests.len().max(1));
        if workers == 1 {
            let mut results = Vec::with_capacity(tests.len());
            for test in tests {
                if self.cancel.is_cancelled() {
                    break;
                }
                results.push(self.run_test(skill, test, model, run));
            }
            return results;
        }

        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<TestResult>>> = Mutex::new(vec![None; tests.len()]);
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(test) = tests.get(index) else {
                        break;
                    };
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    let result = self.run_test(skill, test, model, run);
                    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())[index] =
                        Some(result);
                });
            }
        });

        slots
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .into_iter()
            .flatten()
            .collect()
    }

    /// Execute and score a single test
    pub fn run_test(
        &self,
        skill: &SkillContext,
        test: &TestDefinition,
        model: ModelTier,
        run: u32,
    ) -> TestResult {
        let label = format!("run{}-{}", run, test.name);
        let scoring = &self.config.scoring;

        let mut result = match test.test_type {
            TestType::Knowledge | TestType::Task => {
                let execution = self.execute(skill, test, model, &label);
                ConceptScorer::from_config(scoring).score_execution(test, &execution)
            }
            TestType::Security => {
                let execution = self.execute(skill, test, model, &label);
                SecurityScorer::from_config(scoring).score_execution(test, &execution)
            }
            TestType::Trigger => {
                let context = ProbeContext {
                    skill_path: &skill.path,
                    work_dir: &skill.work_dir,
                    label: &label,
                };
                TriggerScorer::from_config(self.executor.as_ref(), &self.config, self.cancel.clone())
                    .score(test, context)
            }
        };
        result.run = run;

        tracing::debug!(
            test = %test.name,
            run,
            passed = result.passed,
            accuracy = result.metrics.accuracy,
            error = result.error.as_deref().unwrap_or(""),
            "test scored"
        );
        result
    }

    fn execute(
        &self,
        skill: &SkillContext,
        test: &TestDefinition,
        model: ModelTier,
        label: &str,
    ) -> ExecutionResult {
        let request = ExecutionRequest {
            label: label.to_string(),
            prompt: test.prompt.clone(),
            model,
            skill_path: skill.path.clone(),
            work_dir: skill.work_dir.clone(),
            timeout: test.timeout_duration(),
        };
        let retry = self.config.retry_options().cancel_token(self.cancel.clone());
        execute_with_retry(self.executor.as_ref(), &request, &retry, &self.cancel)
    }
}
