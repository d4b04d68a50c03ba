//! Status enums for phases and cycles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

use super::PhaseName;

/// Progress of a single phase row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::Running => "running",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Failed => "failed",
        }
    }
}

impl StateMachine for PhaseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PhaseStatus::*;
        matches!(
            (self, target),
            (Pending, Running) | (Running, Completed) | (Running, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PhaseStatus::*;
        match self {
            Pending => vec![Running],
            Running => vec![Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PhaseStatus::Pending),
            "running" => Ok(PhaseStatus::Running),
            "completed" => Ok(PhaseStatus::Completed),
            "failed" => Ok(PhaseStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "phase_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Lifecycle status of a cycle.
///
/// While active the status mirrors the running phase; `completed` and
/// `rolled_back` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CycleStatus {
    InPhase(PhaseName),
    Completed,
    RolledBack,
}

impl CycleStatus {
    /// Returns true once the cycle can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleStatus::Completed | CycleStatus::RolledBack)
    }

    /// The phase the cycle is in, if still active.
    pub fn phase(&self) -> Option<PhaseName> {
        match self {
            CycleStatus::InPhase(phase) => Some(*phase),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::InPhase(phase) => phase.as_str(),
            CycleStatus::Completed => "completed",
            CycleStatus::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CycleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(CycleStatus::Completed),
            "rolled_back" => Ok(CycleStatus::RolledBack),
            other => other.parse::<PhaseName>().map(CycleStatus::InPhase).map_err(|_| {
                ValidationError::invalid_format(
                    "cycle_status",
                    format!("unknown status '{}'", other),
                )
            }),
        }
    }
}

impl TryFrom<String> for CycleStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CycleStatus> for String {
    fn from(status: CycleStatus) -> Self {
        status.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_status_follows_happy_path() {
        let running = PhaseStatus::Pending.transition_to(PhaseStatus::Running).unwrap();
        let done = running.transition_to(PhaseStatus::Completed).unwrap();
        assert!(done.is_terminal());
    }

    #[test]
    fn phase_status_allows_running_to_failed() {
        assert!(PhaseStatus::Running.can_transition_to(&PhaseStatus::Failed));
    }

    #[test]
    fn phase_status_rejects_reentry() {
        assert!(PhaseStatus::Completed.transition_to(PhaseStatus::Running).is_err());
        assert!(PhaseStatus::Pending.transition_to(PhaseStatus::Completed).is_err());
        assert!(PhaseStatus::Failed.is_terminal());
    }

    #[test]
    fn cycle_status_mirrors_phase_names() {
        assert_eq!(CycleStatus::InPhase(PhaseName::Drying).as_str(), "drying");
        assert_eq!(
            "autoclave".parse::<CycleStatus>().unwrap(),
            CycleStatus::InPhase(PhaseName::Autoclave)
        );
    }

    #[test]
    fn cycle_status_terminal_values() {
        assert!(CycleStatus::Completed.is_terminal());
        assert!(CycleStatus::RolledBack.is_terminal());
        assert!(!CycleStatus::InPhase(PhaseName::Bath1).is_terminal());
        assert_eq!(CycleStatus::Completed.phase(), None);
    }

    #[test]
    fn cycle_status_serializes_as_plain_string() {
        let json = serde_json::to_string(&CycleStatus::RolledBack).unwrap();
        assert_eq!(json, "\"rolled_back\"");
        let back: CycleStatus = serde_json::from_str("\"bath2\"").unwrap();
        assert_eq!(back, CycleStatus::InPhase(PhaseName::Bath2));
    }

    #[test]
    fn cycle_status_rejects_unknown() {
        assert!("archived".parse::<CycleStatus>().is_err());
    }
}
