//! Application handlers.
//!
//! Command and query handlers that orchestrate the voting components inside
//! one unit of work each.

pub mod vote_session;

pub use vote_session::{
    // Commands
    AddRestaurantsCommand, AddRestaurantsHandler,
    CastVoteCommand, CastVoteHandler,
    CreateSessionCommand, CreateSessionHandler,
    EndSessionCommand, EndSessionHandler,
    RemoveRestaurantsCommand, RemoveRestaurantsHandler,
    StartSessionCommand, StartSessionHandler,
    UpdateSessionCommand, UpdateSessionHandler,
    // Queries
    GetResultsHandler, GetResultsQuery,
    GetSessionHandler, GetSessionQuery,
    ListMyVotesHandler, ListMyVotesQuery,
    ListSessionVotesHandler, ListSessionVotesQuery,
    ListSessionsHandler, ListSessionsQuery, SessionScope,
    // Maintenance
    SweepExpiredHandler,
};
