//! Fixed-delay bounded retries.

use std::time::Duration;

use head_types::Pacer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Retry an operation up to `max_attempts` times, pausing `delay`
/// between attempts.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use display_acquire::BoundedRetry;
/// use head_types::ManualPacer;
///
/// let retry = BoundedRetry::new(5, Duration::from_secs(1));
/// let mut pacer = ManualPacer::new();
/// let value = retry.run(&mut pacer, |attempt| {
///     if attempt < 3 { Err("not yet") } else { Ok(attempt) }
/// });
/// assert_eq!(value.unwrap(), 3);
/// assert_eq!(pacer.pause_count(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedRetry {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Pause after each failed attempt except the last.
    pub delay: Duration,
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Attempts made.
    pub attempts: u32,

    /// Error from the final attempt, if any attempt ran.
    pub last_error: Option<E>,
}

impl BoundedRetry {
    /// Creates a retry policy.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Runs `op` until it succeeds or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] carrying the last error once every
    /// attempt has failed. A zero budget fails without calling `op`.
    pub fn run<T, E, P, F>(&self, pacer: &mut P, op: F) -> Result<T, RetryExhausted<E>>
    where
        P: Pacer + ?Sized,
        F: FnMut(u32) -> Result<T, E>,
    {
        self.run_while(pacer, |_| true, op)
    }

    /// Like [`run`](Self::run), but stops at the first error for which
    /// `retryable` returns `false`, without pausing.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] with the attempts actually made and the
    /// error that ended the loop.
    pub fn run_while<T, E, P, R, F>(
        &self,
        pacer: &mut P,
        retryable: R,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        P: Pacer + ?Sized,
        R: Fn(&E) -> bool,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempts = 0;
        let mut last_error = None;
        while attempts < self.max_attempts {
            attempts += 1;
            match op(attempts) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(attempt = attempts, max = self.max_attempts, "attempt failed");
                    let retry = retryable(&e);
                    last_error = Some(e);
                    if !retry {
                        debug!(attempt = attempts, "error is not retryable");
                        break;
                    }
                    if attempts < self.max_attempts {
                        pacer.pause(self.delay);
                    }
                }
            }
        }
        Err(RetryExhausted {
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use head_types::ManualPacer;

    #[test]
    fn first_success_does_not_pause() {
        let mut pacer = ManualPacer::new();
        let r: Result<u32, RetryExhausted<()>> =
            BoundedRetry::new(3, Duration::from_secs(1)).run(&mut pacer, Ok);
        assert_eq!(r.unwrap(), 1);
        assert_eq!(pacer.pause_count(), 0);
    }

    #[test]
    fn exhausted_keeps_last_error() {
        let mut pacer = ManualPacer::new();
        let mut calls = 0;
        let r: Result<(), _> = BoundedRetry::new(4, Duration::from_millis(250)).run(&mut pacer, |n| {
            calls += 1;
            Err(format!("attempt {n}"))
        });
        let err = r.unwrap_err();
        assert_eq!(calls, 4);
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last_error.as_deref(), Some("attempt 4"));
        assert_eq!(pacer.pause_count(), 3);
        assert_eq!(pacer.total_paused(), Duration::from_millis(750));
    }

    #[test]
    fn zero_budget_never_calls() {
        let mut pacer = ManualPacer::new();
        let r: Result<(), RetryExhausted<()>> =
            BoundedRetry::new(0, Duration::from_secs(1)).run(&mut pacer, |_| panic!("called"));
        let err = r.unwrap_err();
        assert_eq!(err.attempts, 0);
        assert!(err.last_error.is_none());
    }

    #[test]
    fn fatal_error_stops_without_pause() {
        let mut pacer = ManualPacer::new();
        let mut calls = 0;
        let r: Result<(), _> = BoundedRetry::new(5, Duration::from_secs(1)).run_while(
            &mut pacer,
            |e: &&str| *e != "fatal",
            |n| {
                calls += 1;
                Err(if n == 2 { "fatal" } else { "transient" })
            },
        );
        let err = r.unwrap_err();
        assert_eq!(calls, 2);
        assert_eq!(err.attempts, 2);
        assert_eq!(err.last_error, Some("fatal"));
        assert_eq!(pacer.pause_count(), 1);
    }
}
