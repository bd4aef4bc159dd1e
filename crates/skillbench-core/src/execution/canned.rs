//! Deterministic executor that replays canned event streams

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::json;

use super::{AgentExecutor, ExecutionRequest, ExecutionResult};
use crate::cancel::CancelToken;
use crate::transcript::parse_transcript;

/// What the canned agent does for a prompt
#[derive(Debug, Clone, PartialEq)]
pub enum CannedResponse {
    /// Raw event stream, parsed like real agent output
    Transcript(String),
    /// Invocation failure with this error
    Failure(String),
    /// Fail `failures` times, then replay the transcript
    Flaky { failures: u32, transcript: String },
}

/// [`AgentExecutor`] keyed by prompt, for tests and dry runs
#[derive(Debug)]
pub struct CannedExecutor {
    responses: HashMap<String, CannedResponse>,
    default: CannedResponse,
    calls: Mutex<Vec<ExecutionRequest>>,
    failures_seen: Mutex<HashMap<String, u32>>,
}

impl Default for CannedExecutor {
    fn default() -> Self {
        Self {
            responses: HashMap::new(),
            default: CannedResponse::Transcript(String::new()),
            calls: Mutex::new(Vec::new()),
            failures_seen: Mutex::new(HashMap::new()),
        }
    }
}

impl CannedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, prompt: impl Into<String>, transcript: impl Into<String>) -> Self {
        self.responses
            .insert(prompt.into(), CannedResponse::Transcript(transcript.into()));
        self
    }

    pub fn fail(mut self, prompt: impl Into<String>, error: impl Into<String>) -> Self {
        self.responses
            .insert(prompt.into(), CannedResponse::Failure(error.into()));
        self
    }

    pub fn flaky(
        mut self,
        prompt: impl Into<String>,
        failures: u32,
        transcript: impl Into<String>,
    ) -> Self {
        self.responses.insert(
            prompt.into(),
            CannedResponse::Flaky {
                failures,
                transcript: transcript.into(),
            },
        );
        self
    }

    /// Response for prompts without an explicit entry
    pub fn default_response(mut self, response: CannedResponse) -> Self {
        self.default = response;
        self
    }

    /// Every request seen so far, in call order
    pub fn calls(&self) -> Vec<ExecutionRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn replay(&self, prompt: &str, transcript: &str) -> ExecutionResult {
        let parsed = parse_transcript(transcript);
        tracing::debug!(prompt, entries = parsed.entries.len(), "canned response");
        ExecutionResult::from_parsed(parsed, None)
    }
}

impl AgentExecutor for CannedExecutor {
    fn name(&self) -> &str {
        "canned"
    }

    fn execute(&self, request: &ExecutionRequest, cancel: &CancelToken) -> ExecutionResult {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if cancel.is_cancelled() {
            return ExecutionResult::failure("cancelled");
        }

        let response = self.responses.get(&request.prompt).unwrap_or(&self.default);
        match response {
            CannedResponse::Transcript(transcript) => self.replay(&request.prompt, transcript),
            CannedResponse::Failure(error) => ExecutionResult::failure(error.clone()),
            CannedResponse::Flaky {
                failures,
                transcript,
            } => {
                let mut seen = self
                    .failures_seen
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let count = seen.entry(request.prompt.clone()).or_insert(0);
                if *count < *failures {
                    *count += 1;
                    ExecutionResult::failure(format!("transient failure {}", count))
                } else {
                    drop(seen);
                    self.replay(&request.prompt, transcript)
                }
            }
        }
    }
}

/// Event stream with a single assistant text reply
pub fn text_reply(text: &str) -> String {
    tool_reply(text, 0)
}

/// Event stream with an assistant reply that makes `tool_count` tool calls,
/// each answered in a following result entry
pub fn tool_reply(text: &str, tool_count: usize) -> String {
    let mut content = vec![json!({"type": "text", "text": text})];
    let mut results = Vec::new();
    for i in 0..tool_count {
        let id = format!("toolu_{}", i + 1);
        content.push(json!({"type": "tool_use", "id": id, "name": "Bash", "input": {}}));
        results.push(json!({"type": "tool_result", "tool_use_id": id, "text": "ok"}));
    }

    let mut lines = vec![json!({
        "type": "assistant",
        "message": {"role": "assistant", "model": "claude-sonnet", "content": content},
        "inputTokens": 100,
        "outputTokens": 50,
        "costUSD": 0.001,
        "durationMs": 1200
    })];
    if !results.is_empty() {
        lines.push(json!({"type": "result", "message": {"role": "user", "content": results}}));
    }

    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelTier;
    use std::path::PathBuf;
    use std::time::Duration;

    fn request(prompt: &str) -> ExecutionRequest {
        ExecutionRequest {
            label: prompt.into(),
            prompt: prompt.into(),
            model: ModelTier::Haiku,
            skill_path: PathBuf::from("skill"),
            work_dir: PathBuf::from("."),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_tool_reply_parses_through_real_parser() {
        let executor = CannedExecutor::new().respond("schedule", tool_reply("Booked", 2));
        let result = executor.execute(&request("schedule"), &CancelToken::new());
        assert!(result.success);
        assert_eq!(result.response, "Booked");
        assert_eq!(result.metrics.tool_count, 2);
        assert_eq!(result.tool_calls.len(), 2);
        assert!(result.tool_calls.iter().all(|c| c.result.as_deref() == Some("ok")));
        assert_eq!(result.metrics.tokens_total, 150);
    }

    #[test]
    fn test_unknown_prompt_uses_default() {
        let executor = CannedExecutor::new()
            .default_response(CannedResponse::Failure("no agent".into()));
        let result = executor.execute(&request("anything"), &CancelToken::new());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no agent"));
    }

    #[test]
    fn test_flaky_fails_then_succeeds() {
        let executor = CannedExecutor::new().flaky("q", 2, text_reply("finally"));
        let cancel = CancelToken::new();
        assert!(!executor.execute(&request("q"), &cancel).success);
        assert!(!executor.execute(&request("q"), &cancel).success);
        let third = executor.execute(&request("q"), &cancel);
        assert!(third.success);
        assert_eq!(third.response, "finally");
        assert_eq!(executor.calls().len(), 3);
    }
}
