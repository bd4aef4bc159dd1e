//! Run-wide cancellation
//!
//! A `CancelToken` is shared by the runner, the retry controller and every
//! in-flight agent invocation. Cancelling wakes sleepers immediately and
//! makes running invocations kill their child processes.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

/// Cloneable handle to a shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the run as cancelled and wake every waiter
    pub fn cancel(&self) {
        let mut cancelled = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cancelled = true;
        self.state.wakeup.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` if the token was cancelled before the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut cancelled = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = match self.state.wakeup.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}
