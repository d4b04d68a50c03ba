//! PhaseName enum - the five fixed stages of a reprocessing cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// One of the ordered reprocessing stages.
///
/// Order is fixed: bath1 → bath2 → drying → autoclave → packaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    Bath1,
    Bath2,
    Drying,
    Autoclave,
    Packaging,
}

impl PhaseName {
    /// All phases in pipeline order.
    pub const ALL: [PhaseName; 5] = [
        PhaseName::Bath1,
        PhaseName::Bath2,
        PhaseName::Drying,
        PhaseName::Autoclave,
        PhaseName::Packaging,
    ];

    /// The phase every new cycle starts in.
    pub fn first() -> Self {
        PhaseName::Bath1
    }

    /// 1-based position in the pipeline.
    pub fn order(&self) -> i16 {
        match self {
            PhaseName::Bath1 => 1,
            PhaseName::Bath2 => 2,
            PhaseName::Drying => 3,
            PhaseName::Autoclave => 4,
            PhaseName::Packaging => 5,
        }
    }

    /// The phase that follows this one, if any.
    pub fn next(&self) -> Option<Self> {
        let idx = self.order() as usize;
        Self::ALL.get(idx).copied()
    }

    /// Returns true if `target` immediately follows this phase.
    pub fn is_followed_by(&self, target: PhaseName) -> bool {
        self.next() == Some(target)
    }

    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Bath1 => "bath1",
            PhaseName::Bath2 => "bath2",
            PhaseName::Drying => "drying",
            PhaseName::Autoclave => "autoclave",
            PhaseName::Packaging => "packaging",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhaseName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|p| p.as_str() == s.trim())
            .copied()
            .ok_or_else(|| {
                ValidationError::invalid_format("phase_name", format!("unknown phase '{}'", s))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_one_based_and_sequential() {
        let orders: Vec<i16> = PhaseName::ALL.iter().map(|p| p.order()).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn next_walks_the_pipeline() {
        assert_eq!(PhaseName::Bath1.next(), Some(PhaseName::Bath2));
        assert_eq!(PhaseName::Bath2.next(), Some(PhaseName::Drying));
        assert_eq!(PhaseName::Autoclave.next(), Some(PhaseName::Packaging));
        assert_eq!(PhaseName::Packaging.next(), None);
    }

    #[test]
    fn is_followed_by_rejects_skips_and_backward_moves() {
        assert!(PhaseName::Bath2.is_followed_by(PhaseName::Drying));
        assert!(!PhaseName::Bath1.is_followed_by(PhaseName::Drying));
        assert!(!PhaseName::Drying.is_followed_by(PhaseName::Bath2));
    }

    #[test]
    fn parses_storage_names() {
        for phase in PhaseName::ALL {
            assert_eq!(phase.as_str().parse::<PhaseName>().unwrap(), phase);
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("rinse".parse::<PhaseName>().is_err());
        assert!("".parse::<PhaseName>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PhaseName::Bath2).unwrap(), "\"bath2\"");
    }
}
