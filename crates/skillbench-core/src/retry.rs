//! Retry with graceful degradation
//!
//! `with_retry` runs a fallible operation up to `max_retries + 1` times and,
//! when every attempt fails, resolves to [`RetryOutcome::Degraded`] instead
//! of an error. Callers decide what the fallback is.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelToken;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Default delay between attempts
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Result of a retried operation.
///
/// `Degraded` is distinct from every value `T` can take, including "empty"
/// ones like `false`, `0` or `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Succeeded(T),
    Degraded { attempts: u32, last_error: String },
}

impl<T> RetryOutcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RetryOutcome::Degraded { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            RetryOutcome::Succeeded(value) => Some(value),
            RetryOutcome::Degraded { .. } => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            RetryOutcome::Succeeded(value) => Some(value),
            RetryOutcome::Degraded { .. } => None,
        }
    }
}

/// Callback invoked before each retry with the 1-based attempt number that failed
pub type RetryHook = Arc<dyn Fn(u32, &str) + Send + Sync>;

/// A boxed operation for [`with_retry_chain`]
pub type Operation<'a, T, E> = Box<dyn FnMut() -> Result<T, E> + 'a>;

/// Retry policy plus optional hooks
#[derive(Clone)]
pub struct RetryOptions {
    max_retries: u32,
    delay: Duration,
    exponential_backoff: bool,
    on_retry: Option<RetryHook>,
    cancel: Option<CancelToken>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_DELAY,
            exponential_backoff: false,
            on_retry: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .field("exponential_backoff", &self.exponential_backoff)
            .field("on_retry", &self.on_retry.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    pub fn on_retry(mut self, hook: impl Fn(u32, &str) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Abort waits and further attempts once the token is cancelled
    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Delay after the failed attempt with 0-based index `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.exponential_backoff {
            self.delay.saturating_mul(2u32.saturating_pow(attempt))
        } else {
            self.delay
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Wait before the next attempt; returns `true` if cancelled while waiting
    fn wait(&self, delay: Duration) -> bool {
        match &self.cancel {
            Some(cancel) => cancel.sleep(delay),
            None => {
                std::thread::sleep(delay);
                false
            }
        }
    }
}

/// Run `operation` until it succeeds or the retry budget is spent.
pub fn with_retry<T, E, F>(mut operation: F, options: &RetryOptions) -> RetryOutcome<T>
where
    F: FnMut() -> Result<T, E>,
    E: fmt::Display,
{
    let max_attempts = options.max_retries.saturating_add(1);
    let mut attempts = 0;
    let mut last_error = String::new();

    for attempt in 0..max_attempts {
        if options.is_cancelled() {
            last_error = "cancelled".to_string();
            break;
        }

        attempts += 1;
        match operation() {
            Ok(value) => return RetryOutcome::Succeeded(value),
            Err(e) => last_error = e.to_string(),
        }

        if attempt + 1 == max_attempts {
            break;
        }

        if let Some(hook) = &options.on_retry {
            hook(attempt + 1, &last_error);
        }
        let delay = options.delay_for(attempt);
        tracing::warn!(
            attempt = attempt + 1,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %last_error,
            "attempt failed, retrying"
        );
        if options.wait(delay) {
            last_error = format!("cancelled after: {}", last_error);
            break;
        }
    }

    tracing::warn!(attempts, error = %last_error, "retries exhausted, degrading");
    RetryOutcome::Degraded {
        attempts,
        last_error,
    }
}

/// Try each operation in order, each under [`with_retry`], returning the
/// first success. Degrades only when every operation degrades.
pub fn with_retry_chain<T, E>(
    operations: Vec<Operation<'_, T, E>>,
    options: &RetryOptions,
) -> RetryOutcome<T>
where
    E: fmt::Display,
{
    let mut attempts = 0;
    let mut last_error = "no operations to try".to_string();

    for (index, mut operation) in operations.into_iter().enumerate() {
        match with_retry(&mut operation, options) {
            RetryOutcome::Succeeded(value) => return RetryOutcome::Succeeded(value),
            RetryOutcome::Degraded {
                attempts: used,
                last_error: error,
            } => {
                tracing::debug!(strategy = index, error = %error, "strategy degraded, trying next");
                attempts += used;
                last_error = error;
            }
        }
        if options.is_cancelled() {
            break;
        }
    }

    RetryOutcome::Degraded {
        attempts,
        last_error,
    }
}
