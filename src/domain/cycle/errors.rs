//! Cycle-specific error types.
//!
//! | Error | Meaning |
//! |-------|---------|
//! | Validation | Missing actor/facility, empty or malformed input |
//! | NotFound | Cycle, phase, or item absent or in an unexpected state |
//! | Conflict | Phase already running, item already assigned, duplicate completion |
//! | Transaction | Underlying write failed (after compensation ran) |

use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCategory, ValidationError};

/// Failures surfaced by the cycle services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl CycleError {
    pub fn not_found(message: impl Into<String>) -> Self {
        CycleError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CycleError::Conflict(message.into())
    }

    /// Maps a port failure observed while reading state.
    pub fn from_port(operation: &str, err: DomainError) -> Self {
        Self::from_cause(TransactionError::new(operation, UnitStep::Read, err))
    }

    /// Maps a transaction failure to the taxonomy by the category of its cause.
    ///
    /// Business-rule causes (not found, conflict, validation) surface as their
    /// own variant; only infrastructure causes remain `Transaction`.
    pub fn from_cause(err: TransactionError) -> Self {
        match err.cause.category() {
            ErrorCategory::NotFound => CycleError::NotFound(err.cause.message),
            ErrorCategory::Conflict => CycleError::Conflict(err.cause.message),
            ErrorCategory::Validation => CycleError::Validation(ValidationError::invalid_format(
                err.cause
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "input".to_string()),
                err.cause.message,
            )),
            ErrorCategory::Infrastructure => CycleError::Transaction(err),
        }
    }

    /// Returns the broad category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CycleError::Validation(_) => ErrorCategory::Validation,
            CycleError::NotFound(_) => ErrorCategory::NotFound,
            CycleError::Conflict(_) => ErrorCategory::Conflict,
            CycleError::Transaction(_) => ErrorCategory::Infrastructure,
        }
    }

    /// Stable machine-readable tag for callers.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Validation(_) => "ValidationError",
            CycleError::NotFound(_) => "NotFoundError",
            CycleError::Conflict(_) => "ConflictError",
            CycleError::Transaction(_) => "TransactionError",
        }
    }

    pub fn as_transaction(&self) -> Option<&TransactionError> {
        match self {
            CycleError::Transaction(err) => Some(err),
            _ => None,
        }
    }
}

/// Which part of a unit of work was executing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitStep {
    Read,
    Precondition,
    CycleWrite,
    PhaseWrite,
    ItemWrite,
    AuditAppend,
}

impl fmt::Display for UnitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitStep::Read => "read",
            UnitStep::Precondition => "precondition",
            UnitStep::CycleWrite => "cycle write",
            UnitStep::PhaseWrite => "phase write",
            UnitStep::ItemWrite => "item write",
            UnitStep::AuditAppend => "audit append",
        };
        write!(f, "{}", s)
    }
}

/// A unit of work failed; every applied write has been compensated unless
/// `compensation_failures` says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Transaction '{operation}' failed during {step}: {cause}")]
pub struct TransactionError {
    pub operation: String,
    pub step: UnitStep,
    #[source]
    pub cause: DomainError,
    pub compensation_failures: Vec<String>,
}

impl TransactionError {
    pub fn new(operation: impl Into<String>, step: UnitStep, cause: DomainError) -> Self {
        Self {
            operation: operation.into(),
            step,
            cause,
            compensation_failures: Vec::new(),
        }
    }

    pub fn with_compensation_failures(mut self, failures: Vec<String>) -> Self {
        self.compensation_failures = failures;
        self
    }

    /// Returns true if every compensating action succeeded.
    pub fn is_fully_compensated(&self) -> bool {
        self.compensation_failures.is_empty()
    }
}
