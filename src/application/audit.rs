//! AuditRecorder - builds the one audit entry each mutation appends.
//!
//! Entries are assembled here and handed to the coordinator as part of the
//! unit of work, so the trail is written only when the state writes succeed.

use serde_json::{json, Value};

use crate::domain::cycle::{AuditAction, AuditEntry, Cycle, ItemAssignment, PhaseName};
use crate::domain::foundation::{Identity, ItemId, Timestamp};

/// Stateless builder for cycle audit entries.
pub struct AuditRecorder;

impl AuditRecorder {
    /// Entry for a freshly created cycle.
    pub fn cycle_created(
        identity: &Identity,
        cycle: &Cycle,
        item_ids: &[ItemId],
        at: Timestamp,
    ) -> AuditEntry {
        Self::entry(identity, AuditAction::CycleCreated, cycle, at)
            .with_new_values(snapshot(cycle))
            .with_metadata(json!({
                "item_count": item_ids.len(),
                "item_ids": ids(item_ids),
                "cycle_type": cycle.cycle_type(),
                "notes": cycle.notes(),
            }))
    }

    /// Entry for a phase change, including items that left early.
    pub fn phase_transition(
        identity: &Identity,
        before: &Cycle,
        after: &Cycle,
        from: PhaseName,
        to: PhaseName,
        removed: &[ItemId],
        at: Timestamp,
    ) -> AuditEntry {
        Self::entry(identity, AuditAction::PhaseTransition, after, at)
            .with_old_values(snapshot(before))
            .with_new_values(snapshot(after))
            .with_metadata(json!({
                "from_phase": from.as_str(),
                "to_phase": to.as_str(),
                "items_removed": ids(removed),
            }))
    }

    pub fn cycle_completed(
        identity: &Identity,
        before: &Cycle,
        after: &Cycle,
        final_phase: PhaseName,
        items_returned: usize,
        receipt_ref: Option<&str>,
        at: Timestamp,
    ) -> AuditEntry {
        Self::entry(identity, AuditAction::CycleCompleted, after, at)
            .with_old_values(snapshot(before))
            .with_new_values(snapshot(after))
            .with_metadata(json!({
                "final_phase": final_phase.as_str(),
                "items_returned": items_returned,
                "receipt_ref": receipt_ref,
            }))
    }

    pub fn cycle_rolled_back(
        identity: &Identity,
        before: &Cycle,
        after: &Cycle,
        released: &[ItemAssignment],
        at: Timestamp,
    ) -> AuditEntry {
        let released: Vec<ItemId> = released.iter().map(|i| i.item_id.clone()).collect();
        Self::entry(identity, AuditAction::CycleRolledBack, after, at)
            .with_old_values(snapshot(before))
            .with_new_values(snapshot(after))
            .with_metadata(json!({
                "items_released": ids(&released),
            }))
    }

    fn entry(identity: &Identity, action: AuditAction, cycle: &Cycle, at: Timestamp) -> AuditEntry {
        AuditEntry::for_cycle(
            identity.actor_id.clone(),
            identity.facility_id.clone(),
            action,
            cycle.id(),
            at,
        )
    }
}

fn snapshot(cycle: &Cycle) -> Value {
    json!({
        "status": cycle.status().as_str(),
        "start_time": cycle.start_time(),
        "end_time": cycle.end_time(),
        "updated_at": cycle.updated_at(),
    })
}

fn ids(item_ids: &[ItemId]) -> Vec<&str> {
    item_ids.iter().map(ItemId::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{FacilityId, UserId};

    fn identity() -> Identity {
        Identity {
            actor_id: UserId::new("tech-1").unwrap(),
            facility_id: FacilityId::new("facility-1").unwrap(),
        }
    }

    fn cycle() -> Cycle {
        let id = identity();
        Cycle::new(
            id.facility_id,
            "routine",
            Some("weekly load".to_string()),
            id.actor_id,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn cycle_created_lists_items() {
        let cycle = cycle();
        let items = vec![ItemId::new("T1").unwrap(), ItemId::new("T2").unwrap()];

        let entry = AuditRecorder::cycle_created(&identity(), &cycle, &items, Timestamp::now());

        assert_eq!(entry.action, AuditAction::CycleCreated);
        assert!(entry.concerns(cycle.id()));
        assert_eq!(entry.actor_id.as_str(), "tech-1");
        assert_eq!(entry.metadata["item_count"], 2);
        assert_eq!(entry.metadata["item_ids"], json!(["T1", "T2"]));
        assert_eq!(entry.metadata["notes"], "weekly load");
        assert_eq!(entry.new_values.unwrap()["status"], "bath1");
        assert!(entry.old_values.is_none());
    }

    #[test]
    fn phase_transition_records_both_sides() {
        let before = cycle();
        let mut after = before.clone();
        after.advance_to(PhaseName::Drying, Timestamp::now()).unwrap();

        let entry = AuditRecorder::phase_transition(
            &identity(),
            &before,
            &after,
            PhaseName::Bath2,
            PhaseName::Drying,
            &[ItemId::new("T2").unwrap()],
            Timestamp::now(),
        );

        assert_eq!(entry.metadata["from_phase"], "bath2");
        assert_eq!(entry.metadata["to_phase"], "drying");
        assert_eq!(entry.metadata["items_removed"], json!(["T2"]));
        assert_eq!(entry.old_values.unwrap()["status"], "bath1");
        assert_eq!(entry.new_values.unwrap()["status"], "drying");
    }

    #[test]
    fn cycle_completed_carries_receipt_reference() {
        let before = cycle();
        let mut after = before.clone();
        after.complete(Timestamp::now()).unwrap();

        let entry = AuditRecorder::cycle_completed(
            &identity(),
            &before,
            &after,
            PhaseName::Packaging,
            3,
            Some("RCPT-42"),
            Timestamp::now(),
        );

        assert_eq!(entry.metadata["items_returned"], 3);
        assert_eq!(entry.metadata["receipt_ref"], "RCPT-42");
        assert_eq!(entry.new_values.unwrap()["status"], "completed");
    }
}
