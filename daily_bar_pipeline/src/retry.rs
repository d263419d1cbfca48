//! Bounded retry with linear backoff.
//!
//! Every failure is retried, whatever its kind: vendor instability is the
//! common case for these endpoints, and application-level errors (quota
//! notices, truncated payloads) are frequently transient too. The log line
//! for each failed attempt says whether the error looked like a network fault
//! so that a persistent application error stays visible.
//!
//! Waiting goes through the [`Pause`] trait; production code sleeps on the
//! tokio timer, tests record the requested delays instead.

use std::{fmt, future::Future, sync::Mutex, time::Duration};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::providers::ProviderError;

/// How often to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay after the failed attempt `attempt` (1-based). Linear, not
    /// exponential.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Something that can make the run wait.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested delays without waiting. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingPause {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// Lets the retry log say whether an error looked like a network fault.
pub trait FailureKind {
    fn is_network(&self) -> bool {
        false
    }
}

impl FailureKind for ProviderError {
    fn is_network(&self) -> bool {
        ProviderError::is_network(self)
    }
}

/// The last error of an operation that used up its retry budget.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Runs `op` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `op` receives the 1-based attempt number. After a failed attempt `n`
/// (other than the last) the run waits `policy.delay_for(n)`. `label`
/// identifies the call in the logs (typically the window bounds).
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    pause: &dyn Pause,
    label: &str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display + FailureKind,
{
    let max = policy.attempts();
    let mut attempt = 1;
    loop {
        info!(request = label, attempt, max_attempts = max, "requesting");
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max => {
                let wait = policy.delay_for(attempt);
                let kind = if e.is_network() { "network" } else { "api" };
                warn!(
                    request = label,
                    attempt,
                    max_attempts = max,
                    kind,
                    wait_secs = wait.as_secs_f64(),
                    error = %e,
                    "attempt failed, retrying"
                );
                pause.pause(wait).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    request = label,
                    attempts = attempt,
                    error = %e,
                    "all retry attempts failed"
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky(&'static str);

    impl fmt::Display for Flaky {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl FailureKind for Flaky {}

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(5))
    }

    #[test]
    fn delays_grow_linearly() {
        let p = policy();
        assert_eq!(p.delay_for(1), Duration::from_secs(5));
        assert_eq!(p.delay_for(2), Duration::from_secs(10));
        assert_eq!(p.delay_for(3), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let pause = RecordingPause::new();
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff(&policy(), &pause, "w1", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt <= 2 {
                    Err(Flaky("connection reset"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            pause.delays(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let pause = RecordingPause::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_with_backoff(&policy(), &pause, "w1", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Flaky("token invalid")) }
        })
        .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last_error.to_string(), "token invalid");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // no wait after the final attempt
        assert_eq!(pause.delays().len(), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let pause = RecordingPause::new();
        let result: Result<(), _> = retry_with_backoff(
            &RetryPolicy::new(0, Duration::from_secs(1)),
            &pause,
            "w1",
            |_| async { Err(Flaky("boom")) },
        )
        .await;
        assert_eq!(result.unwrap_err().attempts, 1);
        assert!(pause.delays().is_empty());
    }
}
