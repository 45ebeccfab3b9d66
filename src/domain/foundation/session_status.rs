//! VoteSessionStatus enum for tracking the lifecycle of vote sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Lifecycle status of a vote session.
///
/// Progresses Draft -> Active -> Closed and never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoteSessionStatus {
    #[default]
    Draft,
    Active,
    Closed,
}

impl VoteSessionStatus {
    /// Candidate restaurants may only change while drafting.
    pub fn allows_membership_changes(&self) -> bool {
        matches!(self, VoteSessionStatus::Draft)
    }

    /// Votes are only accepted while active.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, VoteSessionStatus::Active)
    }

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteSessionStatus::Draft => "draft",
            VoteSessionStatus::Active => "active",
            VoteSessionStatus::Closed => "closed",
        }
    }
}

impl StateMachine for VoteSessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use VoteSessionStatus::*;
        matches!((self, target), (Draft, Active) | (Active, Closed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use VoteSessionStatus::*;
        match self {
            Draft => vec![Active],
            Active => vec![Closed],
            Closed => vec![],
        }
    }
}

impl fmt::Display for VoteSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteSessionStatus::Draft => "Draft",
            VoteSessionStatus::Active => "Active",
            VoteSessionStatus::Closed => "Closed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for VoteSessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(VoteSessionStatus::Draft),
            "active" => Ok(VoteSessionStatus::Active),
            "closed" => Ok(VoteSessionStatus::Closed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown vote session status '{}'", other),
            )),
        }
    }
}
