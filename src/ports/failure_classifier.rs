//! FailureClassifier port - decides whether a failed unit of work may be retried.
//!
//! The engine never retries. Callers that want retries wrap operations in
//! [`RetryPolicy`](crate::application::RetryPolicy), which consults a
//! classifier for every `TransactionError`.

use crate::domain::cycle::{CycleError, TransactionError};
use crate::domain::foundation::ErrorCode;

/// Whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    /// Transient: network, timeout, pool exhaustion.
    Retryable,
    /// Permanent: constraint or validation failures, business-rule rejections.
    NonRetryable,
}

impl Retryability {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Retryability::Retryable)
    }
}

/// Classification policy supplied by the caller.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, err: &TransactionError) -> Retryability;

    /// Classifies any cycle error; only transaction failures can be retryable.
    fn classify_error(&self, err: &CycleError) -> Retryability {
        match err.as_transaction() {
            Some(tx) => self.classify(tx),
            None => Retryability::NonRetryable,
        }
    }
}

/// Default policy keyed on the cause's error code.
///
/// A unit whose compensation partially failed is never retried; the state it
/// left behind needs an operator first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCodeClassifier;

impl FailureClassifier for ErrorCodeClassifier {
    fn classify(&self, err: &TransactionError) -> Retryability {
        if !err.is_fully_compensated() {
            return Retryability::NonRetryable;
        }
        match err.cause.code {
            ErrorCode::ConnectionFailed | ErrorCode::Timeout | ErrorCode::DatabaseError => {
                Retryability::Retryable
            }
            _ => Retryability::NonRetryable,
        }
    }
}
