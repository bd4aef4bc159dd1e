//! Executor that spawns the `claude` command-line agent

use std::collections::HashMap;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::{AgentExecutor, ExecutionRequest, ExecutionResult};
use crate::cancel::CancelToken;
use crate::config::{BenchConfig, ModelPricingConfig, ModelTier};
use crate::error::Result;
use crate::pricing::estimate_cost;
use crate::trace_time;
use crate::transcript::{parse_transcript, TranscriptWriter};

/// How often a running agent is checked for deadline and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Minimum wait for output readers once the agent has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Lines of stderr kept in failure messages
const STDERR_TAIL_LINES: usize = 10;

/// How a child process stopped
enum Termination {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
    WaitFailed(std::io::Error),
}

/// Runs the agent binary in print mode with a stream-json event stream on stdout
#[derive(Debug, Clone)]
pub struct ClaudeCliExecutor {
    binary: String,
    extra_args: Vec<String>,
    pricing: HashMap<ModelTier, ModelPricingConfig>,
    writer: Option<TranscriptWriter>,
}

impl ClaudeCliExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            pricing: HashMap::new(),
            writer: None,
        }
    }

    /// Executor configured from `[agent]` and `[pricing]`
    pub fn from_config(config: &BenchConfig) -> Result<Self> {
        let mut executor = Self::new(config.agent.binary.clone())
            .with_extra_args(config.agent.extra_args.clone());
        for tier in ModelTier::ALL {
            if let Some(pricing) = config.pricing_for(tier) {
                executor.pricing.insert(tier, pricing);
            }
        }
        if let Some(dir) = &config.agent.transcript_dir {
            executor.writer = Some(TranscriptWriter::new(dir)?);
        }
        Ok(executor)
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn with_transcript_writer(mut self, writer: TranscriptWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_pricing(mut self, tier: ModelTier, pricing: ModelPricingConfig) -> Self {
        self.pricing.insert(tier, pricing);
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Arguments for one invocation; the prompt is always last
    pub fn build_args(&self, request: &ExecutionRequest) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
            "--model".to_string(),
            request.model.as_str().to_string(),
            "--add-dir".to_string(),
            request.skill_path.display().to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(request.prompt.clone());
        args
    }

    fn spawn(&self, request: &ExecutionRequest) -> std::io::Result<Child> {
        let mut command = Command::new(&self.binary);
        command
            .args(self.build_args(request))
            .current_dir(&request.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command.spawn()
    }

    fn wait(
        &self,
        child: &mut Child,
        request: &ExecutionRequest,
        cancel: &CancelToken,
        start: Instant,
    ) -> Termination {
        let deadline = start + request.timeout;
        loop {
            match child.wait_timeout(POLL_INTERVAL) {
                Ok(Some(status)) => return Termination::Exited(status),
                Ok(None) => {}
                Err(e) => {
                    kill_process_tree(child);
                    return Termination::WaitFailed(e);
                }
            }

            if cancel.is_cancelled() {
                tracing::warn!(label = %request.label, "run cancelled, killing agent");
                kill_process_tree(child);
                return Termination::Cancelled;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    label = %request.label,
                    timeout_secs = request.timeout.as_secs(),
                    "agent timed out, killing"
                );
                kill_process_tree(child);
                return Termination::TimedOut;
            }
        }
    }

    fn finish(
        &self,
        request: &ExecutionRequest,
        status: ExitStatus,
        stdout: &str,
        stderr: &str,
        elapsed: Duration,
    ) -> ExecutionResult {
        self.retain(&request.label, stdout);

        if !status.success() && stdout.trim().is_empty() {
            return ExecutionResult::failure(format!(
                "agent exited with {}: {}",
                status,
                stderr_tail(stderr)
            ));
        }

        let error = (!status.success()).then(|| format!("agent exited with {}", status));
        let mut result = ExecutionResult::from_parsed(parse_transcript(stdout), error);

        if result.metrics.cost_usd == 0.0 && result.metrics.tokens_total > 0 {
            if let Some(pricing) = self.pricing.get(&request.model) {
                result.metrics.cost_usd = estimate_cost(
                    *pricing,
                    result.metrics.tokens_input,
                    result.metrics.tokens_output,
                );
            }
        }
        if result.metrics.duration_ms == 0 {
            result.metrics.duration_ms = elapsed.as_millis() as u64;
        }
        result
    }

    fn retain(&self, label: &str, stdout: &str) {
        if let Some(writer) = &self.writer {
            if let Err(e) = writer.write_raw(label, stdout) {
                tracing::warn!(label, error = %e, "failed to retain transcript");
            }
        }
    }
}

impl AgentExecutor for ClaudeCliExecutor {
    fn name(&self) -> &str {
        "claude"
    }

    fn execute(&self, request: &ExecutionRequest, cancel: &CancelToken) -> ExecutionResult {
        if cancel.is_cancelled() {
            return ExecutionResult::failure("cancelled");
        }

        let start = Instant::now();
        let mut child = match self.spawn(request) {
            Ok(child) => child,
            Err(e) => {
                return ExecutionResult::failure(format!(
                    "failed to spawn {}: {}",
                    self.binary, e
                ))
            }
        };
        tracing::debug!(label = %request.label, pid = child.id(), model = %request.model, "agent started");

        let stdout = child.stdout.take().map(read_to_end);
        let stderr = child.stderr.take().map(read_to_end);

        let termination = self.wait(&mut child, request, cancel, start);
        let result = match termination {
            Termination::Exited(status) => {
                // Descendants that inherited the pipes would keep the readers open
                kill_process_group(&child);
                let deadline = (start + request.timeout).max(Instant::now() + OUTPUT_GRACE);
                match (collect_output(stdout, deadline), collect_output(stderr, deadline)) {
                    (Some(stdout), Some(stderr)) => {
                        self.finish(request, status, &stdout, &stderr, start.elapsed())
                    }
                    _ => {
                        tracing::warn!(label = %request.label, "agent output still open at deadline");
                        timed_out(request)
                    }
                }
            }
            // Partial output is dropped; readers finish once the pipes close
            Termination::TimedOut => timed_out(request),
            Termination::Cancelled => ExecutionResult::failure("cancelled"),
            Termination::WaitFailed(e) => {
                ExecutionResult::failure(format!("failed to wait for agent: {}", e))
            }
        };

        trace_time!(start, "execute", success = result.success);
        result
    }
}

fn read_to_end<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Output of a reader, or `None` if the pipe is still open at `deadline`
fn collect_output(reader: Option<Receiver<String>>, deadline: Instant) -> Option<String> {
    match reader {
        Some(rx) => rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .ok(),
        None => Some(String::new()),
    }
}

fn timed_out(request: &ExecutionRequest) -> ExecutionResult {
    ExecutionResult::failure(format!(
        "timed out after {} seconds",
        request.timeout.as_secs()
    ))
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "no output".to_string()
    } else {
        tail
    }
}

/// SIGKILL every process in the agent's process group
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::debug!(pgid, error = %err, "process group kill failed");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

/// Kill the child and everything it started, then reap it
fn kill_process_tree(child: &mut Child) {
    kill_process_group(child);
    if let Err(e) = child.kill() {
        tracing::debug!(pid = child.id(), error = %e, "agent kill failed");
    }
    if let Err(e) = child.wait() {
        tracing::warn!(pid = child.id(), error = %e, "failed to reap agent");
    }
}
