//! CastVoteHandler - Command handler for casting one weighted vote.

use std::sync::Arc;

use crate::application::voting::{CastOutcome, VoteLedger};
use crate::domain::foundation::{CommandMetadata, RestaurantId, VoteSessionId};
use crate::domain::voting::VotingError;
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

#[derive(Debug, Clone)]
pub struct CastVoteCommand {
    pub session_id: VoteSessionId,
    pub restaurant_id: RestaurantId,
}

/// Handler for casting votes.
///
/// A lost race for the same vote slot surfaces as `ConstraintViolation`,
/// which callers may retry.
pub struct CastVoteHandler {
    store: Arc<dyn VotingStore>,
    ledger: Arc<VoteLedger>,
    clock: Arc<dyn Clock>,
}

impl CastVoteHandler {
    pub fn new(store: Arc<dyn VotingStore>, ledger: Arc<VoteLedger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ledger,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CastVoteCommand,
        metadata: CommandMetadata,
    ) -> Result<CastOutcome, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .ledger
            .cast(
                uow.as_mut(),
                &cmd.session_id,
                &metadata.user_id,
                &cmd.restaurant_id,
                now,
            )
            .await;

        match complete(uow, outcome).await {
            Ok(cast) => {
                tracing::info!(
                    session_id = %cmd.session_id,
                    user_id = %metadata.user_id,
                    restaurant_id = %cmd.restaurant_id,
                    sequence = cast.vote.sequence(),
                    source = metadata.source().unwrap_or("unknown"),
                    "Vote cast"
                );
                Ok(cast)
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    session_id = %cmd.session_id,
                    user_id = %metadata.user_id,
                    "Concurrent vote lost the race: {}",
                    e
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::vote_session::test_support::Fixture;
    use crate::domain::foundation::VoteSessionStatus;

    fn handler(fx: &Fixture) -> CastVoteHandler {
        CastVoteHandler::new(fx.store.clone(), fx.ledger.clone(), fx.clock.clone())
    }

    fn vote(session_id: VoteSessionId, restaurant: i64) -> CastVoteCommand {
        CastVoteCommand {
            session_id,
            restaurant_id: RestaurantId::new(restaurant),
        }
    }

    #[tokio::test]
    async fn votes_are_persisted_with_schedule_weights() {
        let fx = Fixture::new();
        let id = fx.active(None).await;
        let handler = handler(&fx);

        handler.handle(vote(id, 1), Fixture::metadata(5)).await.unwrap();
        let second = handler.handle(vote(id, 2), Fixture::metadata(5)).await.unwrap();

        assert_eq!(second.vote.weight(), 0.5);
        assert_eq!(second.remaining_votes, 1);
        assert_eq!(fx.store.votes(&id).await.len(), 2);
    }

    #[tokio::test]
    async fn budget_exhausted_after_three_votes() {
        let fx = Fixture::new();
        let id = fx.active(None).await;
        let handler = handler(&fx);
        for _ in 0..3 {
            handler.handle(vote(id, 1), Fixture::metadata(5)).await.unwrap();
        }

        let result = handler.handle(vote(id, 1), Fixture::metadata(5)).await;
        assert_eq!(result, Err(VotingError::BudgetExhausted { votes_per_user: 3 }));
        assert_eq!(fx.store.votes(&id).await.len(), 3);
    }

    #[tokio::test]
    async fn vote_after_deadline_closes_session_and_is_rejected() {
        let fx = Fixture::new();
        let id = fx.active(Some(60)).await;
        fx.clock.advance_secs(61);

        let result = handler(&fx).handle(vote(id, 1), Fixture::metadata(5)).await;
        assert!(matches!(result, Err(VotingError::InvalidState(_))));

        let stored = fx.store.session(&id).await.unwrap();
        assert_eq!(stored.status(), VoteSessionStatus::Closed);
        assert!(fx.store.votes(&id).await.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_rolls_back() {
        let fx = Fixture::new();
        let id = fx.active(None).await;
        fx.store.set_fail_writes(true);

        let result = handler(&fx).handle(vote(id, 1), Fixture::metadata(5)).await;
        assert!(matches!(result, Err(VotingError::Infrastructure(_))));

        fx.store.set_fail_writes(false);
        assert!(fx.store.votes(&id).await.is_empty());
    }
}
