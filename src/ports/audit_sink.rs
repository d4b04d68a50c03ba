//! AuditSink port - append-only audit trail.

use async_trait::async_trait;

use crate::domain::cycle::AuditEntry;
use crate::domain::foundation::DomainError;

/// Port for appending audit entries.
///
/// The engine never updates or deletes what it appended, including during
/// compensation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &AuditEntry) -> Result<(), DomainError>;
}
