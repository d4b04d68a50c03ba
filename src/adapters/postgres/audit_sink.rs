//! PostgreSQL implementation of AuditSink.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::cycle::AuditEntry;
use crate::domain::foundation::DomainError;
use crate::ports::AuditSink;

use super::db_error::db_error;

/// Appends audit entries to the `audit_logs` table.
#[derive(Clone)]
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn append(&self, entry: &AuditEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, actor_id, facility_id, action, resource_type, resource_id,
                old_values, new_values, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.actor_id.as_str())
        .bind(entry.facility_id.as_str())
        .bind(entry.action.as_str())
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.metadata)
        .bind(entry.recorded_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to append audit entry", e))?;

        Ok(())
    }
}
