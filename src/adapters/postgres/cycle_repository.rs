//! PostgreSQL implementation of CycleRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::cycle::{Cycle, CycleStatus};
use crate::domain::foundation::{
    CycleId, DomainError, ErrorCode, FacilityId, Timestamp, UserId,
};
use crate::ports::CycleRepository;

use super::db_error::{corrupt, db_error};

/// PostgreSQL implementation of CycleRepository.
#[derive(Clone)]
pub struct PostgresCycleRepository {
    pool: PgPool,
}

impl PostgresCycleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn cycle_not_found(id: &CycleId) -> DomainError {
    DomainError::new(ErrorCode::CycleNotFound, format!("Cycle not found: {}", id))
        .with_detail("cycle_id", id.to_string())
}

#[async_trait]
impl CycleRepository for PostgresCycleRepository {
    async fn insert(&self, cycle: &Cycle) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO reprocessing_cycles (
                id, facility_id, cycle_type, status, start_time, end_time,
                notes, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(cycle.id().as_uuid())
        .bind(cycle.facility_id().as_str())
        .bind(cycle.cycle_type())
        .bind(cycle.status().as_str())
        .bind(cycle.start_time().as_datetime())
        .bind(cycle.end_time().map(|t| *t.as_datetime()))
        .bind(cycle.notes())
        .bind(cycle.created_by().as_str())
        .bind(cycle.created_at().as_datetime())
        .bind(cycle.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert cycle", e))?;

        Ok(())
    }

    async fn update(&self, cycle: &Cycle) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE reprocessing_cycles SET
                status = $3,
                end_time = $4,
                notes = $5,
                updated_at = $6
            WHERE id = $1 AND facility_id = $2
            "#,
        )
        .bind(cycle.id().as_uuid())
        .bind(cycle.facility_id().as_str())
        .bind(cycle.status().as_str())
        .bind(cycle.end_time().map(|t| *t.as_datetime()))
        .bind(cycle.notes())
        .bind(cycle.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update cycle", e))?;

        if result.rows_affected() == 0 {
            return Err(cycle_not_found(&cycle.id()));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        facility_id: &FacilityId,
        id: &CycleId,
    ) -> Result<Option<Cycle>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, facility_id, cycle_type, status, start_time, end_time,
                   notes, created_by, created_at, updated_at
            FROM reprocessing_cycles
            WHERE id = $1 AND facility_id = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(facility_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch cycle", e))?;

        row.map(row_to_cycle).transpose()
    }

    async fn delete(&self, facility_id: &FacilityId, id: &CycleId) -> Result<(), DomainError> {
        let result = sqlx::query(
            "DELETE FROM reprocessing_cycles WHERE id = $1 AND facility_id = $2",
        )
        .bind(id.as_uuid())
        .bind(facility_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to delete cycle", e))?;

        if result.rows_affected() == 0 {
            return Err(cycle_not_found(id));
        }
        Ok(())
    }
}

fn row_to_cycle(row: PgRow) -> Result<Cycle, DomainError> {
    let id: Uuid = row.get("id");
    let facility_id: String = row.get("facility_id");
    let cycle_type: String = row.get("cycle_type");
    let status: String = row.get("status");
    let start_time: chrono::DateTime<chrono::Utc> = row.get("start_time");
    let end_time: Option<chrono::DateTime<chrono::Utc>> = row.get("end_time");
    let notes: Option<String> = row.get("notes");
    let created_by: String = row.get("created_by");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(Cycle::reconstitute(
        CycleId::from_uuid(id),
        FacilityId::new(facility_id).map_err(|e| corrupt("facility_id", e))?,
        cycle_type,
        status
            .parse::<CycleStatus>()
            .map_err(|e| corrupt("status", e))?,
        Timestamp::from_datetime(start_time),
        end_time.map(Timestamp::from_datetime),
        notes,
        UserId::new(created_by).map_err(|e| corrupt("created_by", e))?,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
