//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `voting` - Vote session aggregate, vote records and tallies

pub mod foundation;
pub mod voting;
