//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the lunch vote domain.

mod command;
mod errors;
mod ids;
mod session_status;
mod state_machine;
mod timestamp;

pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{RestaurantId, UserId, VoteId, VoteSessionId};
pub use session_status::VoteSessionStatus;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
