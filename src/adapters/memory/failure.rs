//! Failure injection for the in-memory adapters.
//!
//! Lets tests make a specific port call fail (optionally after letting a
//! number of calls through) to exercise compensation paths.

use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Operation names checked by the in-memory adapters.
pub mod ops {
    pub const CYCLE_INSERT: &str = "cycle.insert";
    pub const CYCLE_UPDATE: &str = "cycle.update";
    pub const CYCLE_FIND: &str = "cycle.find";
    pub const CYCLE_DELETE: &str = "cycle.delete";
    pub const PHASE_INSERT: &str = "phase.insert_all";
    pub const PHASE_UPDATE: &str = "phase.update";
    pub const PHASE_FIND: &str = "phase.find";
    pub const PHASE_DELETE: &str = "phase.delete_by_cycle";
    pub const ITEM_ASSIGN: &str = "item.assign";
    pub const ITEM_SET_PHASE: &str = "item.set_phase";
    pub const ITEM_SET_STATUS: &str = "item.set_status";
    pub const ITEM_CLEAR: &str = "item.clear_cycle_assignment";
    pub const ITEM_FIND: &str = "item.find";
    pub const ITEM_RESTORE: &str = "item.restore";
    pub const AUDIT_APPEND: &str = "audit.append";
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: String,
    skip: usize,
    remaining: Option<usize>,
    error: DomainError,
}

/// Shared set of failure rules.
#[derive(Debug, Default)]
pub struct FailureInjector {
    rules: Mutex<Vec<FailureRule>>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call to `operation` fails with `code` until cleared.
    pub async fn fail_always(&self, operation: &str, code: ErrorCode) {
        self.push(operation, 0, None, code).await;
    }

    /// Let `skip` calls through, then fail the next one once.
    pub async fn fail_after(&self, operation: &str, skip: usize, code: ErrorCode) {
        self.push(operation, skip, Some(1), code).await;
    }

    /// Fail the next call to `operation` once.
    pub async fn fail_once(&self, operation: &str, code: ErrorCode) {
        self.fail_after(operation, 0, code).await;
    }

    /// Remove all rules.
    pub async fn clear(&self) {
        self.rules.lock().await.clear();
    }

    async fn push(&self, operation: &str, skip: usize, remaining: Option<usize>, code: ErrorCode) {
        self.rules.lock().await.push(FailureRule {
            operation: operation.to_string(),
            skip,
            remaining,
            error: DomainError::new(code, format!("Injected failure in {}", operation)),
        });
    }

    /// Returns the injected error for this call, if a rule fires.
    pub async fn check(&self, operation: &str) -> Result<(), DomainError> {
        let mut rules = self.rules.lock().await;
        let Some(idx) = rules.iter().position(|r| r.operation == operation) else {
            return Ok(());
        };

        let rule = &mut rules[idx];
        if rule.skip > 0 {
            rule.skip -= 1;
            return Ok(());
        }

        let error = rule.error.clone();
        let exhausted = match rule.remaining {
            Some(n) if n <= 1 => true,
            Some(ref mut n) => {
                *n -= 1;
                false
            }
            None => false,
        };
        if exhausted {
            rules.remove(idx);
        }
        Err(error)
    }
}
