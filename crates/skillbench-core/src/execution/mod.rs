//! Agent execution
//!
//! An [`AgentExecutor`] runs one prompt against the external agent and
//! reports what happened as an [`ExecutionResult`]. Failures (spawn errors,
//! bad exits, timeouts, cancellation) are data on the result, never errors.

pub mod canned;
pub mod claude;

use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::config::ModelTier;
use crate::results::BenchmarkMetrics;
use crate::retry::{with_retry, RetryOptions, RetryOutcome};
use crate::transcript::{ParsedTranscript, ToolCall, TranscriptEntry, UNKNOWN_MODEL};

pub use canned::{CannedExecutor, CannedResponse};
pub use claude::ClaudeCliExecutor;

/// One agent invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    /// Unique label for logs and retained transcripts
    pub label: String,
    pub prompt: String,
    pub model: ModelTier,
    pub skill_path: PathBuf,
    pub work_dir: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub response: String,
    pub transcript: Vec<TranscriptEntry>,
    pub metrics: BenchmarkMetrics,
    pub tool_calls: Vec<ToolCall>,
    pub model: String,
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A failed invocation with no usable output
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: String::new(),
            transcript: Vec::new(),
            metrics: BenchmarkMetrics::default(),
            tool_calls: Vec::new(),
            model: UNKNOWN_MODEL.to_string(),
            error: Some(error.into()),
        }
    }

    /// Result built from a parsed event stream
    pub fn from_parsed(parsed: ParsedTranscript, error: Option<String>) -> Self {
        Self {
            success: error.is_none(),
            response: parsed.final_response,
            transcript: parsed.entries,
            metrics: parsed.metrics,
            tool_calls: parsed.tool_calls,
            model: parsed.model,
            error,
        }
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown execution failure")
    }
}

/// Runs prompts against an agent
pub trait AgentExecutor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Run one invocation to completion, timeout or cancellation
    fn execute(&self, request: &ExecutionRequest, cancel: &CancelToken) -> ExecutionResult;
}

/// Run `request` under the retry policy.
///
/// Unsuccessful invocations are retried; once the budget is spent the last
/// failed result is returned so its partial metrics are kept.
pub fn execute_with_retry(
    executor: &dyn AgentExecutor,
    request: &ExecutionRequest,
    options: &RetryOptions,
    cancel: &CancelToken,
) -> ExecutionResult {
    let last_failure = RefCell::new(None);

    let outcome = with_retry(
        || {
            let result = executor.execute(request, cancel);
            if result.success {
                Ok(result)
            } else {
                let message = result.error_message().to_string();
                *last_failure.borrow_mut() = Some(result);
                Err(message)
            }
        },
        options,
    );

    match outcome {
        RetryOutcome::Succeeded(result) => result,
        RetryOutcome::Degraded {
            attempts,
            last_error,
        } => {
            tracing::warn!(
                label = %request.label,
                executor = executor.name(),
                attempts,
                error = %last_error,
                "execution degraded"
            );
            last_failure
                .into_inner()
                .unwrap_or_else(|| ExecutionResult::failure(last_error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::canned::text_reply;
    use super::*;
    use std::time::Duration;

    fn request(prompt: &str) -> ExecutionRequest {
        ExecutionRequest {
            label: "t".into(),
            prompt: prompt.into(),
            model: ModelTier::Sonnet,
            skill_path: PathBuf::from("."),
            work_dir: PathBuf::from("."),
            timeout: Duration::from_secs(5),
        }
    }

    fn fast_retry(max_retries: u32) -> RetryOptions {
        RetryOptions::new()
            .max_retries(max_retries)
            .delay(Duration::from_millis(1))
    }

    #[test]
    fn test_retry_recovers_flaky_execution() {
        let executor = CannedExecutor::new().flaky("q", 1, text_reply("answer"));
        let result = execute_with_retry(&executor, &request("q"), &fast_retry(1), &CancelToken::new());
        assert!(result.success);
        assert_eq!(result.response, "answer");
        assert_eq!(executor.call_count(), 2);
    }

    #[test]
    fn test_exhausted_retry_returns_last_failure() {
        let executor = CannedExecutor::new().fail("q", "agent crashed");
        let result = execute_with_retry(&executor, &request("q"), &fast_retry(2), &CancelToken::new());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("agent crashed"));
        assert_eq!(executor.call_count(), 3);
    }

    #[test]
    fn test_cancelled_token_skips_execution() {
        let executor = CannedExecutor::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let options = fast_retry(1).cancel_token(cancel.clone());
        let result = execute_with_retry(&executor, &request("q"), &options, &cancel);
        assert!(!result.success);
        assert_eq!(executor.call_count(), 0);
    }
}
