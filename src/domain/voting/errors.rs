//! Voting-specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, RestaurantId, ValidationError, VoteSessionId};

/// Errors surfaced by vote session operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VotingError {
    #[error("Vote session not found: {0}")]
    SessionNotFound(VoteSessionId),

    #[error("Restaurant not found: {}", join_ids(.0))]
    RestaurantNotFound(Vec<RestaurantId>),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Restaurant {restaurant_id} is not a candidate in session {session_id}")]
    NotMember {
        session_id: VoteSessionId,
        restaurant_id: RestaurantId,
    },

    #[error("Vote budget exhausted: all {votes_per_user} votes already cast")]
    BudgetExhausted { votes_per_user: u32 },

    #[error("Concurrent vote conflict: {0}")]
    ConstraintViolation(String),

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Error: {0}")]
    Infrastructure(String),
}

fn join_ids(ids: &[RestaurantId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl VotingError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        VotingError::Forbidden(message.into())
    }
    pub fn invalid_state(message: impl Into<String>) -> Self {
        VotingError::InvalidState(message.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        VotingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        VotingError::Infrastructure(message.into())
    }

    /// Stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            VotingError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            VotingError::RestaurantNotFound(_) => ErrorCode::RestaurantNotFound,
            VotingError::Forbidden(_) => ErrorCode::Forbidden,
            VotingError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            VotingError::NotMember { .. } => ErrorCode::NotMember,
            VotingError::BudgetExhausted { .. } => ErrorCode::BudgetExhausted,
            VotingError::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            VotingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            VotingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Only a lost race on a vote slot is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VotingError::ConstraintViolation(_))
    }

    /// Rejections are raised by domain checks before any write of the
    /// operation itself, so work already done in the unit of work (the
    /// auto-close sweep) may still be committed.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            VotingError::ConstraintViolation(_) | VotingError::Infrastructure(_)
        )
    }
}

impl From<DomainError> for VotingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ConstraintViolation => VotingError::ConstraintViolation(err.message),
            _ => VotingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for VotingError {
    fn from(err: ValidationError) -> Self {
        VotingError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
