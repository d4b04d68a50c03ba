//! PostgreSQL implementation of PhaseRepository.
//!
//! Phase rows are keyed by `(cycle_id, phase_name)`; the phase data blob is
//! stored as JSONB.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::cycle::{Phase, PhaseName, PhaseStatus};
use crate::domain::foundation::{CycleId, DomainError, ErrorCode, Timestamp};
use crate::ports::PhaseRepository;

use super::db_error::{corrupt, db_error};

const SELECT_COLUMNS: &str = r#"
    SELECT cycle_id, phase_name, phase_status, start_time, end_time,
           duration_minutes, phase_data
    FROM reprocessing_phases
"#;

/// PostgreSQL implementation of PhaseRepository.
#[derive(Clone)]
pub struct PostgresPhaseRepository {
    pool: PgPool,
}

impl PostgresPhaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhaseRepository for PostgresPhaseRepository {
    async fn insert_all(&self, phases: &[Phase]) -> Result<(), DomainError> {
        if phases.is_empty() {
            return Ok(());
        }

        // Single multi-row INSERT so the batch is atomic on its own.
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO reprocessing_phases (cycle_id, phase_name, phase_order, phase_status, \
             start_time, end_time, duration_minutes, phase_data) ",
        );
        builder.push_values(phases, |mut row, phase| {
            row.push_bind(*phase.cycle_id().as_uuid())
                .push_bind(phase.name().as_str())
                .push_bind(phase.order())
                .push_bind(phase.status().as_str())
                .push_bind(phase.start_time().map(|t| *t.as_datetime()))
                .push_bind(phase.end_time().map(|t| *t.as_datetime()))
                .push_bind(phase.duration_minutes())
                .push_bind(phase.phase_data().clone());
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to insert phases", e))?;
        Ok(())
    }

    async fn update(&self, phase: &Phase, expected: PhaseStatus) -> Result<(), DomainError> {
        // Compare-and-set on the status the caller read.
        let result = sqlx::query(
            r#"
            UPDATE reprocessing_phases SET
                phase_status = $3,
                start_time = $4,
                end_time = $5,
                duration_minutes = $6,
                phase_data = $7
            WHERE cycle_id = $1 AND phase_name = $2 AND phase_status = $8
            "#,
        )
        .bind(phase.cycle_id().as_uuid())
        .bind(phase.name().as_str())
        .bind(phase.status().as_str())
        .bind(phase.start_time().map(|t| *t.as_datetime()))
        .bind(phase.end_time().map(|t| *t.as_datetime()))
        .bind(phase.duration_minutes())
        .bind(phase.phase_data())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update phase", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.find(&phase.cycle_id(), phase.name()).await? {
            None => Err(DomainError::new(
                ErrorCode::PhaseNotFound,
                format!("Phase {} not found for cycle {}", phase.name(), phase.cycle_id()),
            )),
            Some(current) => Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!(
                    "Phase {} of cycle {} is {}, expected {}",
                    phase.name(),
                    phase.cycle_id(),
                    current.status(),
                    expected
                ),
            )),
        }
    }

    async fn find_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Phase>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE cycle_id = $1 ORDER BY phase_order",
            SELECT_COLUMNS
        ))
        .bind(cycle_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch phases", e))?;

        rows.into_iter().map(row_to_phase).collect()
    }

    async fn find_running(&self, cycle_id: &CycleId) -> Result<Option<Phase>, DomainError> {
        let row = sqlx::query(&format!(
            "{} WHERE cycle_id = $1 AND phase_status = 'running' ORDER BY phase_order LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(cycle_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch running phase", e))?;

        row.map(row_to_phase).transpose()
    }

    async fn find(
        &self,
        cycle_id: &CycleId,
        name: PhaseName,
    ) -> Result<Option<Phase>, DomainError> {
        let row = sqlx::query(&format!(
            "{} WHERE cycle_id = $1 AND phase_name = $2",
            SELECT_COLUMNS
        ))
        .bind(cycle_id.as_uuid())
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch phase", e))?;

        row.map(row_to_phase).transpose()
    }

    async fn delete_by_cycle(&self, cycle_id: &CycleId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM reprocessing_phases WHERE cycle_id = $1")
            .bind(cycle_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete phases", e))?;

        Ok(result.rows_affected())
    }
}

fn row_to_phase(row: PgRow) -> Result<Phase, DomainError> {
    let cycle_id: Uuid = row.get("cycle_id");
    let name: String = row.get("phase_name");
    let status: String = row.get("phase_status");
    let start_time: Option<chrono::DateTime<chrono::Utc>> = row.get("start_time");
    let end_time: Option<chrono::DateTime<chrono::Utc>> = row.get("end_time");
    let duration_minutes: Option<i64> = row.get("duration_minutes");
    let phase_data: Value = row.get("phase_data");

    Ok(Phase::reconstitute(
        CycleId::from_uuid(cycle_id),
        name.parse::<PhaseName>()
            .map_err(|e| corrupt("phase_name", e))?,
        status
            .parse::<PhaseStatus>()
            .map_err(|e| corrupt("phase_status", e))?,
        start_time.map(Timestamp::from_datetime),
        end_time.map(Timestamp::from_datetime),
        duration_minutes,
        phase_data,
    ))
}
