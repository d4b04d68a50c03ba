//! In-memory implementation of AuditSink.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::cycle::{AuditAction, AuditEntry};
use crate::domain::foundation::{CycleId, DomainError};
use crate::ports::AuditSink;

use super::failure::{ops, FailureInjector};

/// Append-only in-memory audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
    failures: Arc<FailureInjector>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that consults a shared failure injector.
    pub fn with_failures(failures: Arc<FailureInjector>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            failures,
        }
    }

    /// Every appended entry, in order.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Entries about one cycle, in order.
    pub async fn entries_for(&self, cycle_id: CycleId) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.concerns(cycle_id))
            .cloned()
            .collect()
    }

    /// Number of entries with the given action.
    pub async fn count_action(&self, action: AuditAction) -> usize {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.action == action)
            .count()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: &AuditEntry) -> Result<(), DomainError> {
        self.failures.check(ops::AUDIT_APPEND).await?;
        self.entries.write().await.push(entry.clone());
        Ok(())
    }
}
