//! In-memory implementation of ItemStateGateway.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::cycle::{ItemAssignment, ItemStatus, PhaseName};
use crate::domain::foundation::{CycleId, DomainError, ErrorCode, ItemId};
use crate::ports::ItemStateGateway;

use super::failure::{ops, FailureInjector};

/// In-memory inventory keyed by item id.
#[derive(Debug, Default)]
pub struct InMemoryItemStateGateway {
    items: RwLock<BTreeMap<ItemId, ItemAssignment>>,
    failures: Arc<FailureInjector>,
}

impl InMemoryItemStateGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that consults a shared failure injector.
    pub fn with_failures(failures: Arc<FailureInjector>) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            failures,
        }
    }

    /// Adds or replaces an item row.
    pub async fn seed(&self, item: ItemAssignment) {
        self.items.write().await.insert(item.item_id.clone(), item);
    }

    /// Current state of one item.
    pub async fn get(&self, item_id: &ItemId) -> Option<ItemAssignment> {
        self.items.read().await.get(item_id).cloned()
    }

    /// Snapshot of every item.
    pub async fn all(&self) -> Vec<ItemAssignment> {
        self.items.read().await.values().cloned().collect()
    }
}

fn item_not_found(item_id: &ItemId) -> DomainError {
    DomainError::new(ErrorCode::ItemNotFound, format!("Item not found: {}", item_id))
        .with_detail("item_id", item_id.to_string())
}

#[async_trait]
impl ItemStateGateway for InMemoryItemStateGateway {
    async fn set_status(&self, item_id: &ItemId, status: ItemStatus) -> Result<(), DomainError> {
        self.failures.check(ops::ITEM_SET_STATUS).await?;
        let mut items = self.items.write().await;
        let item = items.get_mut(item_id).ok_or_else(|| item_not_found(item_id))?;
        item.status = status;
        Ok(())
    }

    async fn set_phase(&self, item_id: &ItemId, phase: PhaseName) -> Result<(), DomainError> {
        self.failures.check(ops::ITEM_SET_PHASE).await?;
        let mut items = self.items.write().await;
        let item = items.get_mut(item_id).ok_or_else(|| item_not_found(item_id))?;
        item.current_phase = Some(phase);
        Ok(())
    }

    async fn clear_cycle_assignment(
        &self,
        item_ids: &[ItemId],
        status: ItemStatus,
    ) -> Result<u64, DomainError> {
        self.failures.check(ops::ITEM_CLEAR).await?;
        let mut items = self.items.write().await;
        let mut changed = 0;
        for id in item_ids {
            if let Some(item) = items.get_mut(id) {
                item.current_cycle_id = None;
                item.current_phase = None;
                item.status = status;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_by_status(&self, status: ItemStatus) -> Result<Vec<ItemAssignment>, DomainError> {
        self.failures.check(ops::ITEM_FIND).await?;
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|i| i.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, item_ids: &[ItemId]) -> Result<Vec<ItemAssignment>, DomainError> {
        self.failures.check(ops::ITEM_FIND).await?;
        let items = self.items.read().await;
        Ok(item_ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }

    async fn list_by_cycle(&self, cycle_id: &CycleId) -> Result<Vec<ItemAssignment>, DomainError> {
        self.failures.check(ops::ITEM_FIND).await?;
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|i| i.is_assigned_to(*cycle_id))
            .cloned()
            .collect())
    }

    async fn assign_to_cycle(
        &self,
        item_id: &ItemId,
        cycle_id: &CycleId,
        phase: PhaseName,
        status: ItemStatus,
    ) -> Result<(), DomainError> {
        self.failures.check(ops::ITEM_ASSIGN).await?;
        let mut items = self.items.write().await;
        let item = items.get_mut(item_id).ok_or_else(|| item_not_found(item_id))?;
        if let Some(existing) = item.current_cycle_id {
            return Err(DomainError::new(
                ErrorCode::ItemAlreadyAssigned,
                format!("Item {} is already assigned to cycle {}", item_id, existing),
            )
            .with_detail("item_id", item_id.to_string()));
        }
        item.current_cycle_id = Some(*cycle_id);
        item.current_phase = Some(phase);
        item.status = status;
        Ok(())
    }

    async fn restore(&self, snapshot: &ItemAssignment) -> Result<(), DomainError> {
        self.failures.check(ops::ITEM_RESTORE).await?;
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&snapshot.item_id)
            .ok_or_else(|| item_not_found(&snapshot.item_id))?;
        *item = snapshot.clone();
        Ok(())
    }
}
