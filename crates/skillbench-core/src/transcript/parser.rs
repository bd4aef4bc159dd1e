//! Parse an agent's line-delimited event stream into typed entries and metrics

use std::collections::HashMap;
use std::time::Instant;

use crate::results::BenchmarkMetrics;
use crate::trace_time;
use crate::transcript::types::{
    tool_result_text, ContentBlock, EntryKind, ToolCall, TranscriptEntry,
};

/// Model name reported when no entry carries one
pub const UNKNOWN_MODEL: &str = "unknown";

/// Everything derived from one invocation's event stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTranscript {
    pub entries: Vec<TranscriptEntry>,
    /// Token/cost/duration/tool totals; `accuracy` is always zero here
    pub metrics: BenchmarkMetrics,
    /// Text of the last assistant entry that carries any text
    pub final_response: String,
    pub model: String,
    pub tool_calls: Vec<ToolCall>,
    /// Non-blank lines that did not decode
    pub skipped_lines: usize,
}

impl ParsedTranscript {
    /// Every assistant text response, in transcript order
    pub fn all_responses(&self) -> Vec<String> {
        extract_all_responses(&self.entries)
    }
}

/// Parse raw agent output. Never fails: undecodable lines are skipped.
pub fn parse_transcript(raw: &str) -> ParsedTranscript {
    let start = Instant::now();
    let (entries, skipped_lines) = parse_entries(raw);

    let parsed = ParsedTranscript {
        metrics: compute_metrics(&entries),
        final_response: extract_final_response(&entries),
        model: extract_model(&entries),
        tool_calls: extract_tool_calls(&entries),
        skipped_lines,
        entries,
    };

    if skipped_lines > 0 {
        tracing::debug!(skipped_lines, "skipped undecodable transcript lines");
    }
    trace_time!(start, "parse_transcript", entries = parsed.entries.len());
    parsed
}

/// Decode every non-blank line; returns the entries and the number of skipped lines
pub fn parse_entries(raw: &str) -> (Vec<TranscriptEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<TranscriptEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(_) => skipped += 1,
        }
    }

    (entries, skipped)
}

/// Sum tokens, cost and duration; count `tool_use` blocks in assistant entries.
///
/// Cache-creation and cache-read tokens count as input.
pub fn compute_metrics(entries: &[TranscriptEntry]) -> BenchmarkMetrics {
    let mut metrics = BenchmarkMetrics::default();
    let mut duration_ms = 0.0;

    for entry in entries {
        metrics.tokens_input += entry.input_tokens.unwrap_or(0)
            + entry.cache_creation_input_tokens.unwrap_or(0)
            + entry.cache_read_input_tokens.unwrap_or(0);
        metrics.tokens_output += entry.output_tokens.unwrap_or(0);
        metrics.cost_usd += entry.cost_usd.unwrap_or(0.0).max(0.0);
        duration_ms += entry.duration_ms.unwrap_or(0.0).max(0.0);

        if entry.kind == EntryKind::Assistant {
            let tool_uses = entry
                .blocks()
                .iter()
                .filter(|block| matches!(block, ContentBlock::ToolUse { .. }))
                .count();
            metrics.tool_count += tool_uses as u32;
        }
    }

    metrics.tokens_total = metrics.tokens_input + metrics.tokens_output;
    metrics.duration_ms = duration_ms.round() as u64;
    metrics
}

/// Scan backwards for the last assistant entry carrying text
pub fn extract_final_response(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .rev()
        .filter(|entry| entry.kind == EntryKind::Assistant)
        .find_map(TranscriptEntry::text)
        .unwrap_or_default()
}

pub fn extract_all_responses(entries: &[TranscriptEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Assistant)
        .filter_map(TranscriptEntry::text)
        .collect()
}

/// First non-empty model name in forward order
pub fn extract_model(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .find_map(TranscriptEntry::model)
        .unwrap_or(UNKNOWN_MODEL)
        .to_string()
}

/// Correlate `tool_use` blocks with later `tool_result` blocks by id.
///
/// Results are read from `result` entries and from `human` entries, which is
/// where agents that echo tool output back as user turns put them.
pub fn extract_tool_calls(entries: &[TranscriptEntry]) -> Vec<ToolCall> {
    let mut calls: Vec<ToolCall> = Vec::new();
    let mut pending: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        for block in entry.blocks() {
            match (entry.kind, block) {
                (EntryKind::Assistant, ContentBlock::ToolUse { id, name, input }) => {
                    if !id.is_empty() {
                        pending.insert(id.clone(), calls.len());
                    }
                    calls.push(ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                        result: None,
                    });
                }
                (
                    EntryKind::Result | EntryKind::Human,
                    ContentBlock::ToolResult {
                        tool_use_id,
                        text,
                        content,
                    },
                ) if !tool_use_id.is_empty() => {
                    if let Some(index) = pending.remove(tool_use_id) {
                        calls[index].result =
                            Some(tool_result_text(text.as_deref(), content.as_ref()));
                    }
                }
                _ => {}
            }
        }
    }

    calls
}
