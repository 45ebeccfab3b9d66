//! GetResultsHandler - Query handler for live session results.

use std::sync::Arc;

use crate::application::voting::ResultAggregator;
use crate::domain::foundation::VoteSessionId;
use crate::domain::voting::{SessionResults, VotingError};
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

#[derive(Debug, Clone)]
pub struct GetResultsQuery {
    pub session_id: VoteSessionId,
}

pub struct GetResultsHandler {
    store: Arc<dyn VotingStore>,
    results: Arc<ResultAggregator>,
    clock: Arc<dyn Clock>,
}

impl GetResultsHandler {
    pub fn new(
        store: Arc<dyn VotingStore>,
        results: Arc<ResultAggregator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            results,
            clock,
        }
    }

    pub async fn handle(&self, query: GetResultsQuery) -> Result<SessionResults, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .results
            .get_results(uow.as_mut(), &query.session_id, now)
            .await;
        complete(uow, outcome).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::vote_session::test_support::Fixture;
    use crate::application::handlers::vote_session::{CastVoteCommand, CastVoteHandler};
    use crate::domain::foundation::{RestaurantId, VoteSessionStatus};

    fn handler(fx: &Fixture) -> GetResultsHandler {
        GetResultsHandler::new(fx.store.clone(), fx.results.clone(), fx.clock.clone())
    }

    #[tokio::test]
    async fn results_rank_by_weighted_votes() {
        let fx = Fixture::new();
        let id = fx.active(None).await;
        let cast = CastVoteHandler::new(fx.store.clone(), fx.ledger.clone(), fx.clock.clone());
        for (user, restaurant) in [(5, 2), (6, 1), (6, 2)] {
            cast.handle(
                CastVoteCommand {
                    session_id: id,
                    restaurant_id: RestaurantId::new(restaurant),
                },
                Fixture::metadata(user),
            )
            .await
            .unwrap();
        }

        let results = handler(&fx)
            .handle(GetResultsQuery { session_id: id })
            .await
            .unwrap();
        assert_eq!(results.total_votes, 2.5);
        assert_eq!(results.tallies[0].restaurant_id, RestaurantId::new(2));
        assert_eq!(results.tallies[0].weighted_votes, 1.5);
        assert_eq!(results.tallies[0].distinct_voters, 2);
    }

    #[tokio::test]
    async fn reading_results_persists_auto_close() {
        let fx = Fixture::new();
        let id = fx.active(Some(10)).await;
        fx.clock.advance_secs(11);

        let results = handler(&fx)
            .handle(GetResultsQuery { session_id: id })
            .await
            .unwrap();
        assert_eq!(results.status, VoteSessionStatus::Closed);
        assert_eq!(
            fx.store.session(&id).await.unwrap().status(),
            VoteSessionStatus::Closed
        );
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let fx = Fixture::new();
        let id = VoteSessionId::new();

        let result = handler(&fx).handle(GetResultsQuery { session_id: id }).await;
        assert_eq!(result, Err(VotingError::SessionNotFound(id)));
    }
}
