//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};

/// Which failures are worth another attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryMode {
    /// Every failure is retried, including 404s and decode failures.
    #[default]
    Always,
    /// Only [`ErrorKind::is_transient`] failures are retried.
    TransientOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as at least one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub mode: RetryMode,
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            mode: RetryMode::Always,
        }
    }
}
impl RetryPolicy {
    /// No retries at all.
    pub fn once() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Delay slept after failed attempt `attempt` (1-based): `base * 2^(attempt - 1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    fn should_retry(&self, kind: &ErrorKind) -> bool {
        match self.mode {
            RetryMode::Always => true,
            RetryMode::TransientOnly => kind.is_transient(),
        }
    }

    /// Runs `operation` until it succeeds, the attempts are exhausted or the
    /// failure is not retryable under this policy. The last error is returned.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && self.should_retry(&err) => {
                    let delay = self.delay_after(attempt);
                    let kind: &ErrorKind = &err;
                    tracing::warn!(attempt, max_attempts, delay_ms = delay.as_millis() as u64, error = %kind, "Retrying failed request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::Exn;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[rstest]
    #[case(1, 1000)]
    #[case(2, 2000)]
    #[case(3, 4000)]
    fn backoff_doubles(#[case] attempt: u32, #[case] millis: u64) {
        assert_eq!(RetryPolicy::default().delay_after(attempt), Duration::from_millis(millis));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_operation_runs_max_attempts() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();
        let result: Result<()> = RetryPolicy::default()
            .run(|| async {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Exn::from(ErrorKind::Status { path: "/x".into(), status: 500 + attempt as u16 }))
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // The last failure is the one surfaced.
        assert!(matches!(&*result.unwrap_err(), ErrorKind::Status { status: 503, .. }));
        assert!(started.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failure() {
        let attempts = AtomicU32::new(0);
        let value = RetryPolicy::default()
            .run(|| async {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(Exn::from(ErrorKind::Timeout("/x".into())));
                }
                Ok(42)
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_only_gives_up_on_not_found() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy { mode: RetryMode::TransientOnly, ..RetryPolicy::default() };
        let result: Result<()> = policy
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Exn::from(ErrorKind::NotFound("/x".into())))
            })
            .await;
        assert!(matches!(&*result.unwrap_err(), ErrorKind::NotFound(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy { max_attempts: 0, ..RetryPolicy::default() };
        let _: Result<()> = policy
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Exn::from(ErrorKind::Network("/x".into())))
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
