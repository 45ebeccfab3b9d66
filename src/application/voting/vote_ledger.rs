//! VoteLedger - budgeted, weighted votes.
//!
//! Votes are append-only. A user's n-th vote in a session gets sequence n and
//! the n-th weight of the schedule; two racing casts for the same slot are
//! settled by the store's unique key, and the loser sees `ConstraintViolation`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RestaurantId, Timestamp, UserId, VoteSessionId};
use crate::domain::voting::{VoteRecord, VotingError, WeightSchedule};
use crate::ports::{
    MembershipRepository, Page, PageRequest, RowLock, VoteRepository, VoteSessionRepository,
    VotingUnitOfWork,
};

use super::AutoCloseSweep;

/// A recorded vote and the caller's remaining budget.
#[derive(Debug, Clone, PartialEq)]
pub struct CastOutcome {
    pub vote: VoteRecord,
    pub remaining_votes: u32,
}

/// One user's votes in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserVotes {
    pub session_id: VoteSessionId,
    pub user_id: UserId,
    pub votes_per_user: u32,
    pub remaining_votes: u32,
    /// In sequence order.
    pub votes: Vec<VoteRecord>,
}

pub struct VoteLedger {
    schedule: WeightSchedule,
    sweep: AutoCloseSweep,
}

impl VoteLedger {
    pub fn new(schedule: WeightSchedule) -> Self {
        Self {
            schedule,
            sweep: AutoCloseSweep::new(),
        }
    }

    pub fn schedule(&self) -> &WeightSchedule {
        &self.schedule
    }

    /// Cast one vote.
    ///
    /// # Errors (in check order)
    ///
    /// - `SessionNotFound`
    /// - `InvalidState` if the session is not Active after the sweep
    /// - `NotMember` if the restaurant is not a candidate
    /// - `BudgetExhausted` if the user has no votes left
    /// - `ConstraintViolation` if a concurrent cast took the same slot
    pub async fn cast(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        user_id: &UserId,
        restaurant_id: &RestaurantId,
        now: Timestamp,
    ) -> Result<CastOutcome, VotingError> {
        self.sweep.close_if_expired(uow, session_id, now).await?;

        // Shared lock: casts by different users interleave, a concurrent end waits.
        let session = uow
            .load_session(session_id, RowLock::Share)
            .await?
            .ok_or(VotingError::SessionNotFound(*session_id))?;
        session.ensure_accepting_votes()?;

        if !uow.is_member(session_id, restaurant_id).await? {
            return Err(VotingError::NotMember {
                session_id: *session_id,
                restaurant_id: *restaurant_id,
            });
        }

        let cast_so_far = uow.count_votes_by_user(session_id, user_id).await?;
        if cast_so_far >= session.votes_per_user() {
            return Err(VotingError::BudgetExhausted {
                votes_per_user: session.votes_per_user(),
            });
        }

        let vote = VoteRecord::new(
            *session_id,
            *user_id,
            *restaurant_id,
            cast_so_far + 1,
            &self.schedule,
            now,
        );
        uow.insert_vote(&vote).await?;

        Ok(CastOutcome {
            remaining_votes: session.votes_per_user() - vote.sequence(),
            vote,
        })
    }

    /// The caller's own votes and remaining budget.
    pub async fn votes_by_user(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<UserVotes, VotingError> {
        let session = self.sweep.close_if_expired(uow, session_id, now).await?;
        let votes = uow.votes_by_user(session_id, user_id).await?;
        let used = votes.len() as u32;
        Ok(UserVotes {
            session_id: *session_id,
            user_id: *user_id,
            votes_per_user: session.votes_per_user(),
            remaining_votes: session.votes_per_user().saturating_sub(used),
            votes,
        })
    }

    /// Every vote of the session, in casting order.
    pub async fn session_votes(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        page: PageRequest,
        now: Timestamp,
    ) -> Result<Page<VoteRecord>, VotingError> {
        self.sweep.close_if_expired(uow, session_id, now).await?;
        Ok(uow.list_votes(session_id, &page).await?)
    }
}
