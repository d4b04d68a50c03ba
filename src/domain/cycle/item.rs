//! Item assignment - the slice of an inventory item the engine reads and writes.
//!
//! The row itself belongs to the inventory system; the engine only touches it
//! through the `ItemStateGateway` port.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{CycleId, ItemId, ValidationError};

use super::PhaseName;

/// Inventory status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Dirty,
    Clean,
    Available,
    InUse,
    Maintenance,
}

impl ItemStatus {
    /// Status written when an item enters a cycle.
    pub const IN_CYCLE: ItemStatus = ItemStatus::Dirty;

    /// Status written when an item leaves a cycle.
    pub const RELEASED: ItemStatus = ItemStatus::Available;

    /// Returns true for statuses that mean "ready to be used again".
    pub fn is_available_class(&self) -> bool {
        matches!(self, ItemStatus::Clean | ItemStatus::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Dirty => "dirty",
            ItemStatus::Clean => "clean",
            ItemStatus::Available => "available",
            ItemStatus::InUse => "in_use",
            ItemStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dirty" => Ok(ItemStatus::Dirty),
            "clean" => Ok(ItemStatus::Clean),
            "available" => Ok(ItemStatus::Available),
            "in_use" => Ok(ItemStatus::InUse),
            "maintenance" => Ok(ItemStatus::Maintenance),
            other => Err(ValidationError::invalid_format(
                "item_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Priority tag carried by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
    /// Tag that marks an item for early exit after the second bath.
    pub const EARLY_EXIT: Priority = Priority(2);

    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(1)
    }
}

/// Snapshot of an item's cycle-related state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAssignment {
    pub item_id: ItemId,
    pub current_cycle_id: Option<CycleId>,
    pub current_phase: Option<PhaseName>,
    pub status: ItemStatus,
    pub priority: Priority,
}

impl ItemAssignment {
    /// An item sitting in the available pool.
    pub fn available(item_id: ItemId, priority: Priority) -> Self {
        Self {
            item_id,
            current_cycle_id: None,
            current_phase: None,
            status: ItemStatus::Available,
            priority,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.current_cycle_id.is_some()
    }

    pub fn is_assigned_to(&self, cycle_id: CycleId) -> bool {
        self.current_cycle_id == Some(cycle_id)
    }
}
