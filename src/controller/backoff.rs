//! # Conflict Backoff
//!
//! Bounded exponential backoff for optimistic-concurrency conflicts.
//!
//! Writes of materialized Secrets carry the `resourceVersion` they were built
//! from. When another writer got there first the API server answers `409
//! Conflict`; the whole read-modify-write is then repeated after a short,
//! growing delay.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use vault_secret_controller::controller::backoff::ExponentialBackoff;
//!
//! let backoff = ExponentialBackoff::new(4, Duration::from_millis(10), 5, Duration::from_secs(1));
//! let delays: Vec<_> = backoff.delays().collect();
//! assert_eq!(
//!     delays,
//!     vec![Duration::from_millis(10), Duration::from_millis(50), Duration::from_millis(250)]
//! );
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// Total attempts, including the first one
    steps: u32,
    initial: Duration,
    factor: u32,
    cap: Duration,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(steps: u32, initial: Duration, factor: u32, cap: Duration) -> Self {
        Self {
            steps: steps.max(1),
            initial,
            factor: factor.max(1),
            cap,
        }
    }

    /// Build the policy from controller configuration
    #[must_use]
    pub fn from_config(config: &crate::config::ControllerConfig) -> Self {
        Self::new(
            config.conflict_retry_steps,
            Duration::from_millis(config.conflict_retry_initial_ms),
            config.conflict_retry_factor,
            Duration::from_millis(config.conflict_retry_max_ms),
        )
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Delays slept between consecutive attempts
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let mut next = self.initial;
        (1..self.steps).map(move |_| {
            let current = next.min(self.cap);
            next = next.saturating_mul(self.factor);
            current
        })
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::from_config(&crate::config::ControllerConfig::default())
    }
}

/// Run `operation` until it succeeds, fails with an error `is_conflict`
/// rejects, or the policy's attempts are exhausted
///
/// The last conflict is returned on exhaustion.
pub async fn retry_on_conflict<T, E, F, Fut>(
    backoff: &ExponentialBackoff,
    is_conflict: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delays = backoff.delays();
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(err) if is_conflict(&err) => match delays.next() {
                Some(delay) => {
                    debug!(attempt, delay_ms = delay.as_millis(), "write.conflict.retry");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(err),
            },
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Conflict,
        Fatal,
    }

    fn fast_backoff(steps: u32) -> ExponentialBackoff {
        ExponentialBackoff::new(steps, Duration::from_millis(1), 2, Duration::from_millis(4))
    }

    #[test]
    fn test_delays_are_capped() {
        let backoff =
            ExponentialBackoff::new(5, Duration::from_millis(10), 5, Duration::from_millis(100));
        let delays: Vec<_> = backoff.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(50),
                Duration::from_millis(100),
                Duration::from_millis(100),
            ]
        );
    }

    #[test]
    fn test_single_step_never_sleeps() {
        let backoff = ExponentialBackoff::new(0, Duration::from_millis(10), 5, Duration::from_secs(1));
        assert_eq!(backoff.steps(), 1);
        assert_eq!(backoff.delays().count(), 0);
    }

    #[tokio::test]
    async fn test_retries_conflicts_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_on_conflict(
            &fast_backoff(4),
            |e: &TestError| *e == TestError::Conflict,
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Conflict)
                } else {
                    Ok("written")
                }
            },
        )
        .await;

        assert_eq!(result, Ok("written"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_conflict() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_on_conflict(
            &fast_backoff(3),
            |e: &TestError| *e == TestError::Conflict,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Conflict)
            },
        )
        .await;

        assert_eq!(result, Err(TestError::Conflict));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_on_conflict(
            &fast_backoff(4),
            |e: &TestError| *e == TestError::Conflict,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            },
        )
        .await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
