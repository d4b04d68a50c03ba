//! PostgreSQL implementation of ItemStateGateway.
//!
//! Works against the inventory `items` table. Only the cycle-related columns
//! are ever written.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::cycle::{ItemAssignment, ItemStatus, PhaseName, Priority};
use crate::domain::foundation::{CycleId, DomainError, ErrorCode, ItemId};
use crate::ports::ItemStateGateway;

use super::db_error::{corrupt, db_error};

const SELECT_COLUMNS: &str = r#"
    SELECT id, current_cycle_id, current_phase, status, priority
    FROM items
"#;

/// PostgreSQL implementation of ItemStateGateway.
#[derive(Clone)]
pub struct PostgresItemGateway {
    pool: PgPool,
}

impl PostgresItemGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `None` if the item does not exist, otherwise its current cycle.
    async fn current_assignment(
        &self,
        item_id: &ItemId,
    ) -> Result<Option<Option<Uuid>>, DomainError> {
        let row = sqlx::query("SELECT current_cycle_id FROM items WHERE id = $1")
            .bind(item_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to fetch item", e))?;

        Ok(row.map(|r| r.get::<Option<Uuid>, _>("current_cycle_id")))
    }
}

fn item_not_found(item_id: &ItemId) -> DomainError {
    DomainError::new(
        ErrorCode::ItemNotFound,
        format!("Item not found: {}", item_id),
    )
}

fn id_strings(item_ids: &[ItemId]) -> Vec<String> {
    item_ids.iter().map(|id| id.as_str().to_string()).collect()
}

#[async_trait]
impl ItemStateGateway for PostgresItemGateway {
    async fn set_status(&self, item_id: &ItemId, status: ItemStatus) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE items SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(item_id.as_str())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update item status", e))?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(item_id));
        }
        Ok(())
    }

    async fn set_phase(&self, item_id: &ItemId, phase: PhaseName) -> Result<(), DomainError> {
        let result =
            sqlx::query("UPDATE items SET current_phase = $2, updated_at = NOW() WHERE id = $1")
                .bind(item_id.as_str())
                .bind(phase.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to update item phase", e))?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(item_id));
        }
        Ok(())
    }

    async fn clear_cycle_assignment(
        &self,
        item_ids: &[ItemId],
        status: ItemStatus,
    ) -> Result<u64, DomainError> {
        if item_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE items SET
                current_cycle_id = NULL,
                current_phase = NULL,
                status = $2,
                updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(id_strings(item_ids))
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to release items", e))?;

        Ok(result.rows_affected())
    }

    async fn list_by_status(&self, status: ItemStatus) -> Result<Vec<ItemAssignment>, DomainError> {
        let rows = sqlx::query(&format!("{} WHERE status = $1 ORDER BY id", SELECT_COLUMNS))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list items by status", e))?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn find_by_ids(&self, item_ids: &[ItemId]) -> Result<Vec<ItemAssignment>, DomainError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!("{} WHERE id = ANY($1) ORDER BY id", SELECT_COLUMNS))
            .bind(id_strings(item_ids))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to fetch items", e))?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn list_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<ItemAssignment>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE current_cycle_id = $1 ORDER BY id",
            SELECT_COLUMNS
        ))
        .bind(cycle_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list items in cycle", e))?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn assign_to_cycle(
        &self,
        item_id: &ItemId,
        cycle_id: &CycleId,
        phase: PhaseName,
        status: ItemStatus,
    ) -> Result<(), DomainError> {
        // Conditional update: a concurrent assignment makes this a no-op.
        let result = sqlx::query(
            r#"
            UPDATE items SET
                current_cycle_id = $2,
                current_phase = $3,
                status = $4,
                updated_at = NOW()
            WHERE id = $1 AND current_cycle_id IS NULL
            "#,
        )
        .bind(item_id.as_str())
        .bind(cycle_id.as_uuid())
        .bind(phase.as_str())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to assign item", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.current_assignment(item_id).await? {
            None => Err(item_not_found(item_id)),
            Some(existing) => Err(DomainError::new(
                ErrorCode::ItemAlreadyAssigned,
                format!(
                    "Item {} is already assigned to cycle {}",
                    item_id,
                    existing.map(|u| u.to_string()).unwrap_or_default()
                ),
            )),
        }
    }

    async fn restore(&self, snapshot: &ItemAssignment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE items SET
                current_cycle_id = $2,
                current_phase = $3,
                status = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(snapshot.item_id.as_str())
        .bind(snapshot.current_cycle_id.map(|id| *id.as_uuid()))
        .bind(snapshot.current_phase.map(|p| p.as_str()))
        .bind(snapshot.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to restore item", e))?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(&snapshot.item_id));
        }
        Ok(())
    }
}

fn row_to_item(row: PgRow) -> Result<ItemAssignment, DomainError> {
    let id: String = row.get("id");
    let current_cycle_id: Option<Uuid> = row.get("current_cycle_id");
    let current_phase: Option<String> = row.get("current_phase");
    let status: String = row.get("status");
    let priority: i32 = row.get("priority");

    Ok(ItemAssignment {
        item_id: ItemId::new(id).map_err(|e| corrupt("id", e))?,
        current_cycle_id: current_cycle_id.map(CycleId::from_uuid),
        current_phase: current_phase
            .map(|p| p.parse::<PhaseName>())
            .transpose()
            .map_err(|e| corrupt("current_phase", e))?,
        status: status
            .parse::<ItemStatus>()
            .map_err(|e| corrupt("status", e))?,
        priority: Priority::new(priority),
    })
}
