//! Phase entity - one stage row belonging to a cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{CycleId, DomainError, StateMachine, Timestamp};

use super::{PhaseName, PhaseStatus};

/// A single stage of a cycle.
///
/// Rows are created in a batch with the cycle and mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    cycle_id: CycleId,
    name: PhaseName,
    status: PhaseStatus,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    duration_minutes: Option<i64>,
    phase_data: Value,
}

impl Phase {
    /// Creates a pending phase.
    pub fn pending(cycle_id: CycleId, name: PhaseName) -> Self {
        Self {
            cycle_id,
            name,
            status: PhaseStatus::Pending,
            start_time: None,
            end_time: None,
            duration_minutes: None,
            phase_data: empty_data(),
        }
    }

    /// Builds the fixed phase set for a new cycle with the first phase running.
    pub fn initial_set(cycle_id: CycleId, started_at: Timestamp) -> Vec<Self> {
        PhaseName::ALL
            .iter()
            .map(|name| {
                let mut phase = Phase::pending(cycle_id, *name);
                if *name == PhaseName::first() {
                    phase.status = PhaseStatus::Running;
                    phase.start_time = Some(started_at);
                }
                phase
            })
            .collect()
    }

    /// Reconstitutes a phase from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        cycle_id: CycleId,
        name: PhaseName,
        status: PhaseStatus,
        start_time: Option<Timestamp>,
        end_time: Option<Timestamp>,
        duration_minutes: Option<i64>,
        phase_data: Value,
    ) -> Self {
        Self {
            cycle_id,
            name,
            status,
            start_time,
            end_time,
            duration_minutes,
            phase_data,
        }
    }

    pub fn cycle_id(&self) -> CycleId {
        self.cycle_id
    }

    pub fn name(&self) -> PhaseName {
        self.name
    }

    pub fn order(&self) -> i16 {
        self.name.order()
    }

    pub fn status(&self) -> PhaseStatus {
        self.status
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        self.duration_minutes
    }

    pub fn phase_data(&self) -> &Value {
        &self.phase_data
    }

    pub fn is_running(&self) -> bool {
        self.status == PhaseStatus::Running
    }

    /// Marks a pending phase running, seeding its data from `data`.
    pub fn start(&mut self, at: Timestamp, data: Option<&Value>) -> Result<(), DomainError> {
        self.status = self.status.transition_to(PhaseStatus::Running)?;
        self.start_time = Some(at);
        self.phase_data = data.cloned().unwrap_or_else(empty_data);
        Ok(())
    }

    /// Marks a running phase completed and merges `data` into the stored blob.
    pub fn complete(&mut self, at: Timestamp, data: Option<&Value>) -> Result<(), DomainError> {
        self.status = self.status.transition_to(PhaseStatus::Completed)?;
        self.close(at);
        if let Some(data) = data {
            self.phase_data = merge_phase_data(&self.phase_data, data);
        }
        Ok(())
    }

    /// Marks a running phase failed.
    pub fn fail(&mut self, at: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(PhaseStatus::Failed)?;
        self.close(at);
        Ok(())
    }

    fn close(&mut self, at: Timestamp) {
        self.end_time = Some(at);
        self.duration_minutes = self.start_time.map(|start| at.minutes_since(&start));
    }
}

fn empty_data() -> Value {
    Value::Object(Map::new())
}

/// Merges `supplied` into `existing` at the top level; supplied keys win.
///
/// A non-object on either side cannot be merged key-wise, so the object side
/// is kept and the other is stored under `"value"`.
pub fn merge_phase_data(existing: &Value, supplied: &Value) -> Value {
    match (existing, supplied) {
        (Value::Object(base), Value::Object(extra)) => {
            let mut merged = base.clone();
            for (key, value) in extra {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (Value::Object(base), Value::Null) => Value::Object(base.clone()),
        (Value::Object(base), other) => {
            let mut merged = base.clone();
            merged.insert("value".to_string(), other.clone());
            Value::Object(merged)
        }
        (_, supplied) => supplied.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_set_has_five_ordered_phases_with_first_running() {
        let now = Timestamp::now();
        let phases = Phase::initial_set(CycleId::new(), now);

        assert_eq!(phases.len(), 5);
        assert_eq!(phases[0].name(), PhaseName::Bath1);
        assert_eq!(phases[0].status(), PhaseStatus::Running);
        assert_eq!(phases[0].start_time(), Some(now));
        for phase in &phases[1..] {
            assert_eq!(phase.status(), PhaseStatus::Pending);
            assert!(phase.start_time().is_none());
        }
        let running = phases.iter().filter(|p| p.is_running()).count();
        assert_eq!(running, 1);
    }

    #[test]
    fn complete_sets_duration_and_merges_data() {
        let start = Timestamp::now();
        let mut phase = Phase::pending(CycleId::new(), PhaseName::Bath1);
        phase.start(start, Some(&json!({"temperature": 40}))).unwrap();

        let end = start.plus_minutes(12);
        phase
            .complete(end, Some(&json!({"ph": 7.2, "temperature": 42})))
            .unwrap();

        assert_eq!(phase.status(), PhaseStatus::Completed);
        assert_eq!(phase.duration_minutes(), Some(12));
        assert_eq!(phase.phase_data(), &json!({"temperature": 42, "ph": 7.2}));
    }

    #[test]
    fn complete_without_data_keeps_existing_blob() {
        let start = Timestamp::now();
        let mut phase = Phase::pending(CycleId::new(), PhaseName::Drying);
        phase.start(start, Some(&json!({"operator_note": "ok"}))).unwrap();
        phase.complete(start.plus_minutes(1), None).unwrap();

        assert_eq!(phase.phase_data(), &json!({"operator_note": "ok"}));
    }

    #[test]
    fn start_rejects_phase_that_is_not_pending() {
        let now = Timestamp::now();
        let mut phases = Phase::initial_set(CycleId::new(), now);
        assert!(phases[0].start(now, None).is_err());
    }

    #[test]
    fn complete_rejects_pending_phase() {
        let mut phase = Phase::pending(CycleId::new(), PhaseName::Autoclave);
        assert!(phase.complete(Timestamp::now(), None).is_err());
    }

    #[test]
    fn fail_closes_running_phase() {
        let start = Timestamp::now();
        let mut phases = Phase::initial_set(CycleId::new(), start);
        phases[0].fail(start.plus_minutes(3)).unwrap();

        assert_eq!(phases[0].status(), PhaseStatus::Failed);
        assert_eq!(phases[0].duration_minutes(), Some(3));
    }

    #[test]
    fn merge_replaces_non_object_base() {
        assert_eq!(merge_phase_data(&json!(null), &json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn merge_wraps_scalar_supplied_value() {
        assert_eq!(
            merge_phase_data(&json!({"a": 1}), &json!("note")),
            json!({"a": 1, "value": "note"})
        );
    }
}
