//! In-memory implementation of PhaseRepository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::cycle::{Phase, PhaseName, PhaseStatus};
use crate::domain::foundation::{CycleId, DomainError, ErrorCode};
use crate::ports::PhaseRepository;

use super::failure::{ops, FailureInjector};

/// In-memory phase rows keyed by `(cycle_id, phase_name)`.
#[derive(Debug, Default)]
pub struct InMemoryPhaseRepository {
    phases: RwLock<BTreeMap<(CycleId, PhaseName), Phase>>,
    failures: Arc<FailureInjector>,
}

impl InMemoryPhaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that consults a shared failure injector.
    pub fn with_failures(failures: Arc<FailureInjector>) -> Self {
        Self {
            phases: RwLock::new(BTreeMap::new()),
            failures,
        }
    }

    /// Total number of stored phase rows.
    pub async fn count(&self) -> usize {
        self.phases.read().await.len()
    }

    /// Number of running phases for a cycle.
    pub async fn running_count(&self, cycle_id: &CycleId) -> usize {
        self.phases
            .read()
            .await
            .values()
            .filter(|p| p.cycle_id() == *cycle_id && p.is_running())
            .count()
    }

    fn rows_for<'a>(
        phases: &'a BTreeMap<(CycleId, PhaseName), Phase>,
        cycle_id: &'a CycleId,
    ) -> impl Iterator<Item = &'a Phase> + 'a {
        phases.values().filter(move |p| p.cycle_id() == *cycle_id)
    }
}

#[async_trait]
impl PhaseRepository for InMemoryPhaseRepository {
    async fn insert_all(&self, phases: &[Phase]) -> Result<(), DomainError> {
        self.failures.check(ops::PHASE_INSERT).await?;
        let mut rows = self.phases.write().await;
        if let Some(dup) = phases
            .iter()
            .find(|p| rows.contains_key(&(p.cycle_id(), p.name())))
        {
            return Err(DomainError::new(
                ErrorCode::ConstraintViolation,
                format!("Phase {} already exists for cycle {}", dup.name(), dup.cycle_id()),
            ));
        }
        for phase in phases {
            rows.insert((phase.cycle_id(), phase.name()), phase.clone());
        }
        Ok(())
    }

    async fn update(&self, phase: &Phase, expected: PhaseStatus) -> Result<(), DomainError> {
        self.failures.check(ops::PHASE_UPDATE).await?;
        let mut rows = self.phases.write().await;
        match rows.get_mut(&(phase.cycle_id(), phase.name())) {
            Some(existing) if existing.status() != expected => Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!(
                    "Phase {} of cycle {} is {}, expected {}",
                    phase.name(),
                    phase.cycle_id(),
                    existing.status(),
                    expected
                ),
            )),
            Some(existing) => {
                *existing = phase.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::PhaseNotFound,
                format!("Phase {} not found for cycle {}", phase.name(), phase.cycle_id()),
            )),
        }
    }

    async fn find_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Phase>, DomainError> {
        self.failures.check(ops::PHASE_FIND).await?;
        let rows = self.phases.read().await;
        Ok(Self::rows_for(&rows, cycle_id).cloned().collect())
    }

    async fn find_running(&self, cycle_id: &CycleId) -> Result<Option<Phase>, DomainError> {
        self.failures.check(ops::PHASE_FIND).await?;
        let rows = self.phases.read().await;
        let found = Self::rows_for(&rows, cycle_id).find(|p| p.is_running()).cloned();
        Ok(found)
    }

    async fn find(
        &self,
        cycle_id: &CycleId,
        name: PhaseName,
    ) -> Result<Option<Phase>, DomainError> {
        self.failures.check(ops::PHASE_FIND).await?;
        Ok(self.phases.read().await.get(&(*cycle_id, name)).cloned())
    }

    async fn delete_by_cycle(&self, cycle_id: &CycleId) -> Result<u64, DomainError> {
        self.failures.check(ops::PHASE_DELETE).await?;
        let mut rows = self.phases.write().await;
        let before = rows.len();
        rows.retain(|(id, _), _| id != cycle_id);
        Ok((before - rows.len()) as u64)
    }
}
