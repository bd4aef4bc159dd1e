//! `skillbench transcript`

use std::fs;
use std::path::Path;

use serde_json::json;
use skillbench_core::error::{BenchError, Result};
use skillbench_core::transcript::parse_transcript;

use crate::cli::{Cli, OutputFormat};

pub fn execute(cli: &Cli, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .map_err(|e| BenchError::failed(&format!("read {}", file.display()), e))?;
    let parsed = parse_transcript(&raw);

    match cli.format {
        OutputFormat::Json => {
            let output = json!({
                "entries": parsed.entries.len(),
                "skippedLines": parsed.skipped_lines,
                "model": parsed.model,
                "metrics": parsed.metrics,
                "finalResponse": parsed.final_response,
                "responses": parsed.all_responses(),
                "toolCalls": parsed.tool_calls,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            println!("entries: {} ({} skipped lines)", parsed.entries.len(), parsed.skipped_lines);
            println!("model: {}", parsed.model);
            println!(
                "tokens: {} ({} in / {} out)",
                parsed.metrics.tokens_total, parsed.metrics.tokens_input, parsed.metrics.tokens_output
            );
            println!("cost: ${:.4}", parsed.metrics.cost_usd);
            println!("duration: {}ms", parsed.metrics.duration_ms);
            println!("tool calls: {}", parsed.metrics.tool_count);
            for call in &parsed.tool_calls {
                let status = if call.result.is_some() { "answered" } else { "pending" };
                println!("  {} [{}] {}", call.name, call.id, status);
            }
            println!("final response:\n{}", parsed.final_response);
        }
    }
    Ok(())
}
