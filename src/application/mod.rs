//! Application layer - voting components and the handlers that drive them.
//!
//! Components in `voting` hold the rules; handlers in `handlers` own the
//! transaction boundary and the clock.

pub mod handlers;
pub mod voting;

pub use handlers::*;
pub use voting::{
    AutoCloseSweep, CastOutcome, EndSessionOutcome, MemberRestaurant, Membership, NewSession,
    ResultAggregator, SessionDetails, SessionLifecycle, UserVotes, VoteLedger, VotingRules,
};
