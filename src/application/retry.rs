//! RetryPolicy - caller-side exponential backoff for cycle operations.
//!
//! The engine itself never retries. A caller that wants to ride out transient
//! database failures wraps a handler call in [`RetryPolicy::run`]; only errors
//! the [`FailureClassifier`] marks retryable are attempted again, and only
//! after the failed unit has been fully compensated.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryConfig;
use crate::domain::cycle::CycleError;
use crate::ports::{ErrorCodeClassifier, FailureClassifier};

/// Bounded exponential backoff.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    classifier: Arc<dyn FailureClassifier>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            classifier: Arc::new(ErrorCodeClassifier),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn FailureClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`: base * 2^(attempt-1), capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, CycleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CycleError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts
                        || !self.classifier.classify_error(&err).is_retryable()
                    {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after transient failure"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cycle::{TransactionError, UnitStep};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn tx_error(code: ErrorCode) -> CycleError {
        CycleError::Transaction(TransactionError::new(
            "create_cycle",
            UnitStep::CycleWrite,
            DomainError::new(code, "boom"),
        ))
    }

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(300));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for(40), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast(3)
            .run("create_cycle", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(tx_error(ErrorCode::ConnectionFailed))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast(2)
            .run("create_cycle", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(tx_error(ErrorCode::Timeout))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn business_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast(5)
            .run("transition_phase", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CycleError::conflict("already running"))
            })
            .await;

        assert!(matches!(result, Err(CycleError::Conflict(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn constraint_violations_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _ = fast(5)
            .run("create_cycle", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(tx_error(ErrorCode::ConstraintViolation))
            })
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
