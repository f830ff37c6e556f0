//! Bounded retries and the two fallible-step combinators.
//!
//! [`RetryPolicy::run`] returns the value or `None` once attempts are
//! exhausted; [`best_effort`] runs a step once and logs instead of failing.
//! Sleeping goes through [`Sleeper`] so tests never block.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::strategy::ExponentialBackoff;

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

type Backoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// `backoff(n)` is the pause after failed attempt `n` (0-based).
    pub fn new(max_attempts: u32, backoff: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
        }
    }

    /// `base * 2^attempt`: with a 1s base the pauses are 1s, 2s, 4s, ...
    ///
    /// Millisecond resolution. The strategy's n-th delay is
    /// `factor * 2^(n+1)` ms, hence the halved factor.
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        let factor = u64::try_from(base.as_millis() / 2).unwrap_or(u64::MAX);
        Self::new(max_attempts, move |attempt| {
            ExponentialBackoff::from_millis(2)
                .factor(factor)
                .nth(attempt as usize)
                .unwrap_or(Duration::MAX)
        })
    }

    /// Single attempt, no pauses.
    pub fn once() -> Self {
        Self::new(1, |_| Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    /// Call `op` until it succeeds or attempts run out.
    ///
    /// `op` receives the 0-based attempt number. Each failure is logged; no
    /// pause follows the last attempt.
    pub fn run<T, E, F>(&self, what: &str, sleeper: &dyn Sleeper, mut op: F) -> Option<T>
    where
        E: fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        for attempt in 0..self.max_attempts {
            let error = match op(attempt) {
                Ok(value) => return Some(value),
                Err(e) => e,
            };
            let remaining = self.max_attempts - attempt - 1;
            tracing::warn!(what, attempt = attempt + 1, remaining, error = %error, "attempt failed");
            if remaining > 0 {
                sleeper.sleep(self.backoff(attempt));
            }
        }
        None
    }
}

/// Run a step whose failure must not change the outcome: log and move on.
pub fn best_effort<T, E: fmt::Display>(step: &str, op: impl FnOnce() -> Result<T, E>) -> Option<T> {
    match op() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, error = %e, "best-effort step failed");
            None
        }
    }
}
