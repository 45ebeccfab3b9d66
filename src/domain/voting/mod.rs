//! Voting module - vote sessions, weighted votes and result tallies.
//!
//! # Module Structure
//!
//! - `session` - VoteSession aggregate and lifecycle rules
//! - `weight_schedule` - weights for a user's successive votes
//! - `vote` - immutable VoteRecord
//! - `restaurant` - read-only catalog view
//! - `tally` - pure result computation
//! - `errors` - VotingError

mod errors;
mod restaurant;
mod session;
mod tally;
mod vote;
mod weight_schedule;

pub use errors::VotingError;
pub use restaurant::RestaurantRef;
pub use session::{SessionDetailsUpdate, VoteSession, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
pub use tally::{RestaurantTally, SessionResults, TallyCalculator};
pub use vote::VoteRecord;
pub use weight_schedule::WeightSchedule;
