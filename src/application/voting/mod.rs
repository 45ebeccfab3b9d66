//! Vote session components.
//!
//! Each component works inside a caller-provided unit of work and an explicit
//! evaluation time; none of them commits. Handlers own the transaction.
//!
//! - `Membership` - candidate restaurants of a session
//! - `AutoCloseSweep` - lazy expiry of Active sessions
//! - `SessionLifecycle` - create, edit, start, end, list
//! - `VoteLedger` - budgeted weighted votes
//! - `ResultAggregator` - on-demand tallies

mod auto_close;
mod lifecycle;
mod membership;
mod result_aggregator;
mod vote_ledger;

pub use auto_close::AutoCloseSweep;
pub use lifecycle::{EndSessionOutcome, NewSession, SessionDetails, SessionLifecycle};
pub use membership::{MemberRestaurant, Membership};
pub use result_aggregator::ResultAggregator;
pub use vote_ledger::{CastOutcome, UserVotes, VoteLedger};

use crate::domain::voting::WeightSchedule;
use crate::ports::PageRequest;

/// Tunable voting rules.
#[derive(Debug, Clone, PartialEq)]
pub struct VotingRules {
    /// Budget used when a session is created without one.
    pub default_votes_per_user: u32,
    /// Upper bound for a session's budget.
    pub max_votes_per_user: u32,
    pub weight_schedule: WeightSchedule,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for VotingRules {
    fn default() -> Self {
        Self {
            default_votes_per_user: 3,
            max_votes_per_user: 10,
            weight_schedule: WeightSchedule::default(),
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl VotingRules {
    /// Clamp caller-supplied pagination to the configured bounds.
    pub fn page(&self, offset: Option<u32>, limit: Option<u32>) -> PageRequest {
        let limit = limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1));
        PageRequest::new(offset.unwrap_or(0), limit)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::adapters::memory::{InMemoryRestaurantRegistry, InMemoryVotingStore};
    use crate::domain::foundation::{RestaurantId, Timestamp, UserId, VoteSessionId};
    use crate::domain::voting::VoteSession;
    use crate::ports::{VotingStore, VotingUnitOfWork};

    use super::{NewSession, SessionLifecycle, VotingRules};

    pub fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    pub fn registry() -> Arc<InMemoryRestaurantRegistry> {
        Arc::new(InMemoryRestaurantRegistry::with_restaurants([
            (1, "Pho House"),
            (2, "Taco Stand"),
            (3, "Curry Corner"),
        ]))
    }

    pub fn lifecycle(registry: Arc<InMemoryRestaurantRegistry>) -> SessionLifecycle {
        SessionLifecycle::new(registry, VotingRules::default())
    }

    pub async fn begin(store: &InMemoryVotingStore) -> Box<dyn VotingUnitOfWork> {
        store.begin().await.unwrap()
    }

    pub fn new_session(auto_close_at: Option<Timestamp>) -> NewSession {
        NewSession {
            title: "Friday lunch".to_string(),
            description: None,
            votes_per_user: Some(3),
            auto_close_at,
        }
    }

    /// Committed Active session created by user 1 with restaurants 1 and 2.
    pub async fn active_session(
        store: &InMemoryVotingStore,
        lifecycle: &SessionLifecycle,
        auto_close_at: Option<Timestamp>,
        now: Timestamp,
    ) -> VoteSessionId {
        let mut uow = begin(store).await;
        let session: VoteSession = lifecycle
            .create(uow.as_mut(), user(1), new_session(auto_close_at), now)
            .await
            .unwrap();
        let id = *session.id();
        lifecycle
            .add_restaurants(
                uow.as_mut(),
                &id,
                &user(1),
                &[RestaurantId::new(1), RestaurantId::new(2)],
                now,
            )
            .await
            .unwrap();
        lifecycle.start(uow.as_mut(), &id, &user(1), now).await.unwrap();
        uow.commit().await.unwrap();
        id
    }
}
