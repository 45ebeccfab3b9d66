//! ResultAggregator - per-restaurant tallies computed on every read.
//!
//! Nothing is cached or written back; restaurant names are looked up by value
//! at read time.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::foundation::{RestaurantId, Timestamp, VoteSessionId};
use crate::domain::voting::{SessionResults, TallyCalculator, VoteSession, VotingError};
use crate::ports::{RestaurantRegistry, VoteRepository, VotingUnitOfWork};

use super::AutoCloseSweep;

pub struct ResultAggregator {
    registry: Arc<dyn RestaurantRegistry>,
    sweep: AutoCloseSweep,
}

impl ResultAggregator {
    pub fn new(registry: Arc<dyn RestaurantRegistry>, sweep: AutoCloseSweep) -> Self {
        Self { registry, sweep }
    }

    /// Current results of a session, after the target sweep.
    pub async fn get_results(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        now: Timestamp,
    ) -> Result<SessionResults, VotingError> {
        let session = self.sweep.close_if_expired(uow, session_id, now).await?;
        self.compute(uow, &session).await
    }

    /// Tally an already-loaded session.
    pub async fn compute(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session: &VoteSession,
    ) -> Result<SessionResults, VotingError> {
        let votes = uow.votes_for_session(session.id()).await?;
        let restaurant_ids: Vec<RestaurantId> = votes
            .iter()
            .map(|v| *v.restaurant_id())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let restaurants = self.registry.get_many(&restaurant_ids).await?;

        Ok(TallyCalculator::results(
            *session.id(),
            session.status(),
            &votes,
            &restaurants,
        ))
    }
}
