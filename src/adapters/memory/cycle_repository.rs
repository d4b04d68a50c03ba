//! In-memory implementation of CycleRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::cycle::Cycle;
use crate::domain::foundation::{CycleId, DomainError, ErrorCode, FacilityId};
use crate::ports::CycleRepository;

use super::failure::{ops, FailureInjector};

/// In-memory cycle rows keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryCycleRepository {
    cycles: RwLock<HashMap<CycleId, Cycle>>,
    failures: Arc<FailureInjector>,
}

impl InMemoryCycleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that consults a shared failure injector.
    pub fn with_failures(failures: Arc<FailureInjector>) -> Self {
        Self {
            cycles: RwLock::new(HashMap::new()),
            failures,
        }
    }

    /// Number of stored cycles.
    pub async fn count(&self) -> usize {
        self.cycles.read().await.len()
    }

    /// Snapshot of every stored cycle.
    pub async fn all(&self) -> Vec<Cycle> {
        self.cycles.read().await.values().cloned().collect()
    }

    /// Looks up a cycle regardless of facility.
    pub async fn get(&self, id: &CycleId) -> Option<Cycle> {
        self.cycles.read().await.get(id).cloned()
    }
}

fn not_found(id: &CycleId) -> DomainError {
    DomainError::new(ErrorCode::CycleNotFound, format!("Cycle not found: {}", id))
        .with_detail("cycle_id", id.to_string())
}

#[async_trait]
impl CycleRepository for InMemoryCycleRepository {
    async fn insert(&self, cycle: &Cycle) -> Result<(), DomainError> {
        self.failures.check(ops::CYCLE_INSERT).await?;
        let mut cycles = self.cycles.write().await;
        if cycles.contains_key(&cycle.id()) {
            return Err(DomainError::new(
                ErrorCode::ConstraintViolation,
                format!("Duplicate cycle id: {}", cycle.id()),
            ));
        }
        cycles.insert(cycle.id(), cycle.clone());
        Ok(())
    }

    async fn update(&self, cycle: &Cycle) -> Result<(), DomainError> {
        self.failures.check(ops::CYCLE_UPDATE).await?;
        let mut cycles = self.cycles.write().await;
        match cycles.get_mut(&cycle.id()) {
            Some(existing) if existing.facility_id() == cycle.facility_id() => {
                *existing = cycle.clone();
                Ok(())
            }
            _ => Err(not_found(&cycle.id())),
        }
    }

    async fn find_by_id(
        &self,
        facility_id: &FacilityId,
        id: &CycleId,
    ) -> Result<Option<Cycle>, DomainError> {
        self.failures.check(ops::CYCLE_FIND).await?;
        Ok(self
            .cycles
            .read()
            .await
            .get(id)
            .filter(|c| c.facility_id() == facility_id)
            .cloned())
    }

    async fn delete(&self, facility_id: &FacilityId, id: &CycleId) -> Result<(), DomainError> {
        self.failures.check(ops::CYCLE_DELETE).await?;
        let mut cycles = self.cycles.write().await;
        match cycles.get(id) {
            Some(c) if c.facility_id() == facility_id => {
                cycles.remove(id);
                Ok(())
            }
            _ => Err(not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Timestamp, UserId};

    fn cycle(facility: &str) -> Cycle {
        Cycle::new(
            FacilityId::new(facility).unwrap(),
            "routine",
            None,
            UserId::new("tech").unwrap(),
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn find_is_scoped_by_facility() {
        let repo = InMemoryCycleRepository::new();
        let c = cycle("fac-a");
        repo.insert(&c).await.unwrap();

        let own = FacilityId::new("fac-a").unwrap();
        let other = FacilityId::new("fac-b").unwrap();
        assert!(repo.find_by_id(&own, &c.id()).await.unwrap().is_some());
        assert!(repo.find_by_id(&other, &c.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let repo = InMemoryCycleRepository::new();
        let c = cycle("fac-a");
        repo.insert(&c).await.unwrap();

        let err = repo.insert(&c).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConstraintViolation);
    }

    #[tokio::test]
    async fn delete_from_other_facility_is_not_found() {
        let repo = InMemoryCycleRepository::new();
        let c = cycle("fac-a");
        repo.insert(&c).await.unwrap();

        let err = repo
            .delete(&FacilityId::new("fac-b").unwrap(), &c.id())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CycleNotFound);
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn injected_failure_surfaces() {
        let failures = Arc::new(FailureInjector::new());
        failures.fail_once(ops::CYCLE_INSERT, ErrorCode::Timeout).await;
        let repo = InMemoryCycleRepository::with_failures(failures);

        assert!(repo.insert(&cycle("fac-a")).await.is_err());
        assert_eq!(repo.count().await, 0);
    }
}
