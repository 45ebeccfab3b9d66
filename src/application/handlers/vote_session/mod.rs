//! Vote session command and query handlers.
//!
//! Each handler opens one unit of work, runs a component operation and
//! finishes the unit of work through [`complete`].

mod cast_vote;
mod create_session;
mod end_session;
mod get_results;
mod get_session;
mod list_sessions;
mod list_votes;
mod manage_restaurants;
mod start_session;
mod sweep_expired;
mod update_session;

pub use cast_vote::{CastVoteCommand, CastVoteHandler};
pub use create_session::{CreateSessionCommand, CreateSessionHandler};
pub use end_session::{EndSessionCommand, EndSessionHandler};
pub use get_results::{GetResultsHandler, GetResultsQuery};
pub use get_session::{GetSessionHandler, GetSessionQuery};
pub use list_sessions::{ListSessionsHandler, ListSessionsQuery, SessionScope};
pub use list_votes::{
    ListMyVotesHandler, ListMyVotesQuery, ListSessionVotesHandler, ListSessionVotesQuery,
};
pub use manage_restaurants::{
    AddRestaurantsCommand, AddRestaurantsHandler, RemoveRestaurantsCommand,
    RemoveRestaurantsHandler,
};
pub use start_session::{StartSessionCommand, StartSessionHandler};
pub use sweep_expired::SweepExpiredHandler;
pub use update_session::{UpdateSessionCommand, UpdateSessionHandler};

use crate::domain::voting::VotingError;
use crate::ports::{VotingStore, VotingUnitOfWork};

pub(crate) async fn begin(store: &dyn VotingStore) -> Result<Box<dyn VotingUnitOfWork>, VotingError> {
    store.begin().await.map_err(|e| {
        tracing::error!("Failed to open unit of work: {}", e);
        VotingError::from(e)
    })
}

/// Commit on success and on domain rejections, roll back otherwise.
///
/// Rejections happen before the operation writes anything of its own, so the
/// only pending write is the auto-close sweep, which must persist.
pub(crate) async fn complete<T>(
    uow: Box<dyn VotingUnitOfWork>,
    outcome: Result<T, VotingError>,
) -> Result<T, VotingError> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) if err.is_rejection() => {
            uow.commit().await?;
            Err(err)
        }
        Err(err) => {
            if let Err(e) = uow.rollback().await {
                tracing::warn!("Rollback failed after {}: {}", err.code(), e);
            }
            Err(err)
        }
    }
}
