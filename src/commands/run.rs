//! `skillbench run`

use std::env;
use std::fs;
use std::sync::Arc;

use skillbench_core::cancel::CancelToken;
use skillbench_core::config::BenchConfig;
use skillbench_core::error::{BenchError, Result};
use skillbench_core::execution::ClaudeCliExecutor;
use skillbench_core::results::BenchmarkResult;
use skillbench_core::runner::{BenchmarkRunner, SkillContext};

use crate::cli::{Cli, OutputFormat, RunArgs};
use crate::commands::suite::load_suite;

pub fn execute(cli: &Cli, args: &RunArgs, config: BenchConfig, cancel: CancelToken) -> Result<()> {
    let config = apply_overrides(config, args)?;
    let tests = load_suite(&args.tests)?;

    let work_dir = match &args.work_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let skill = SkillContext::from_dir(&args.skill, &work_dir)?;

    let executor = Arc::new(ClaudeCliExecutor::from_config(&config)?);
    let runner = BenchmarkRunner::new(executor, config).with_cancel_token(cancel);
    let result = runner.run(&skill, &tests, args.model, args.runs)?;

    let json = serde_json::to_string_pretty(&result)?;
    if let Some(path) = &args.output {
        fs::write(path, &json)
            .map_err(|e| BenchError::failed(&format!("write {}", path.display()), e))?;
        tracing::info!(path = %path.display(), "wrote benchmark result");
    }

    match cli.format {
        OutputFormat::Json => println!("{}", json),
        OutputFormat::Human => print_summary(&result),
    }
    Ok(())
}

/// Command-line flags win over the configuration file
fn apply_overrides(mut config: BenchConfig, args: &RunArgs) -> Result<BenchConfig> {
    if let Some(parallel) = args.parallel {
        config.execution.parallelism = usize::try_from(parallel)
            .map_err(|_| BenchError::invalid_value("--parallel", parallel))?;
    }
    if let Some(binary) = &args.agent_bin {
        config.agent.binary = binary.clone();
    }
    if let Some(dir) = &args.transcript_dir {
        config.agent.transcript_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_summary(result: &BenchmarkResult) {
    println!(
        "{} ({}, {} run{})",
        result.skill.name,
        result.model,
        result.runs,
        if result.runs == 1 { "" } else { "s" }
    );
    for test in &result.results {
        let status = if test.passed { "PASS" } else { "FAIL" };
        print!(
            "  [{}] run {} {} ({}) {:.1}",
            status, test.run, test.test.name, test.test.test_type, test.metrics.accuracy
        );
        match &test.error {
            Some(error) => println!(" - {}", error),
            None => println!(),
        }
    }

    println!("pass rate: {:.1}%", result.pass_rate);
    println!(
        "avg tokens: {} ({} in / {} out), avg cost: ${:.4}, avg duration: {}ms",
        result.metrics.tokens_total,
        result.metrics.tokens_input,
        result.metrics.tokens_output,
        result.metrics.cost_usd,
        result.metrics.duration_ms
    );
    if let Some(security) = &result.security {
        println!(
            "security: {:.1} (refusal {:.1}%, leakage {:.1}%)",
            security.security_score, security.refusal_rate, security.leakage_rate
        );
        for (category, score) in &security.category_breakdown {
            println!(
                "  {}: refusal {:.1}%, leakage {:.1}% ({} tests)",
                category, score.refusal_rate, score.leakage_rate, score.tests_run
            );
        }
    }
    if let Some(trigger) = &result.trigger {
        println!(
            "trigger: {:.1} (activation {:.1}%, false positives {:.1}%)",
            trigger.trigger_score, trigger.trigger_rate, trigger.false_positive_rate
        );
    }
}
