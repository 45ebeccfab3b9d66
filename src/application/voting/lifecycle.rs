//! SessionLifecycle - the vote session state machine.
//!
//! Draft -> Active via `start`, Active -> Closed via `end` or the
//! auto-close sweep. Every lifecycle change locks the session row.

use std::sync::Arc;

use crate::domain::foundation::{
    RestaurantId, Timestamp, UserId, VoteSessionId, VoteSessionStatus,
};
use crate::domain::voting::{
    SessionDetailsUpdate, SessionResults, VoteSession, VotingError,
};
use crate::ports::{
    MembershipRepository, Page, PageRequest, RestaurantRegistry, RowLock, SessionListFilter,
    VoteSessionRepository, VotingUnitOfWork,
};

use super::{AutoCloseSweep, MemberRestaurant, Membership, ResultAggregator, VotingRules};

/// Input for creating a session.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub title: String,
    pub description: Option<String>,
    /// Falls back to the configured default.
    pub votes_per_user: Option<u32>,
    pub auto_close_at: Option<Timestamp>,
}

/// A session with its candidate restaurants.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDetails {
    pub session: VoteSession,
    pub restaurants: Vec<MemberRestaurant>,
}

/// Result of ending a session.
#[derive(Debug, Clone, PartialEq)]
pub struct EndSessionOutcome {
    pub session: VoteSession,
    pub results: SessionResults,
}

impl EndSessionOutcome {
    pub fn winner(&self) -> Option<RestaurantId> {
        self.results.winner().map(|t| t.restaurant_id)
    }
}

pub struct SessionLifecycle {
    membership: Membership,
    sweep: AutoCloseSweep,
    results: ResultAggregator,
    rules: VotingRules,
}

impl SessionLifecycle {
    pub fn new(registry: Arc<dyn RestaurantRegistry>, rules: VotingRules) -> Self {
        let sweep = AutoCloseSweep::new();
        Self {
            membership: Membership::new(Arc::clone(&registry)),
            sweep,
            results: ResultAggregator::new(registry, sweep),
            rules,
        }
    }

    /// Create a session in Draft.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for invalid details or a budget above the configured maximum
    pub async fn create(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        creator: UserId,
        input: NewSession,
        now: Timestamp,
    ) -> Result<VoteSession, VotingError> {
        let votes_per_user = input
            .votes_per_user
            .unwrap_or(self.rules.default_votes_per_user);
        if votes_per_user > self.rules.max_votes_per_user {
            return Err(VotingError::validation(
                "votes_per_user",
                format!(
                    "At most {} votes per user are allowed",
                    self.rules.max_votes_per_user
                ),
            ));
        }

        let session = VoteSession::new(
            VoteSessionId::new(),
            creator,
            input.title,
            input.description,
            votes_per_user,
            input.auto_close_at,
            now,
        )?;
        uow.insert_session(&session).await?;
        Ok(session)
    }

    /// Edit title, description or deadline (creator only, not once Closed).
    pub async fn update_details(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        requester: &UserId,
        update: SessionDetailsUpdate,
        now: Timestamp,
    ) -> Result<VoteSession, VotingError> {
        self.sweep.close_if_expired(uow, session_id, now).await?;
        let mut session = self.lock(uow, session_id).await?;
        session.update_details(requester, update, now)?;
        uow.update_session(&session).await?;
        Ok(session)
    }

    /// Add candidate restaurants (creator only, Draft only).
    pub async fn add_restaurants(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        requester: &UserId,
        restaurant_ids: &[RestaurantId],
        now: Timestamp,
    ) -> Result<Vec<RestaurantId>, VotingError> {
        let session = self.lock_for_membership(uow, session_id, requester, now).await?;
        self.membership.add(uow, session.id(), restaurant_ids).await
    }

    /// Remove candidate restaurants (creator only, Draft only).
    pub async fn remove_restaurants(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        requester: &UserId,
        restaurant_ids: &[RestaurantId],
        now: Timestamp,
    ) -> Result<Vec<RestaurantId>, VotingError> {
        let session = self.lock_for_membership(uow, session_id, requester, now).await?;
        self.membership.remove(uow, session.id(), restaurant_ids).await
    }

    /// Open the session for voting.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound`
    /// - `Forbidden` if requester is not the creator
    /// - `InvalidState` if not Draft, without candidates, or past the deadline
    pub async fn start(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        requester: &UserId,
        now: Timestamp,
    ) -> Result<VoteSession, VotingError> {
        let mut session = self.lock(uow, session_id).await?;
        let member_count = uow.member_ids(session_id).await?.len();
        session.start(requester, member_count, now)?;
        uow.update_session(&session).await?;
        Ok(session)
    }

    /// Close the session and compute its winner.
    ///
    /// The sweep runs first, so ending a session that already expired
    /// reports `InvalidState`.
    pub async fn end(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        requester: &UserId,
        now: Timestamp,
    ) -> Result<EndSessionOutcome, VotingError> {
        self.sweep.close_if_expired(uow, session_id, now).await?;
        let mut session = self.lock(uow, session_id).await?;
        session.end(requester, now)?;
        uow.update_session(&session).await?;

        let results = self.results.compute(uow, &session).await?;
        Ok(EndSessionOutcome { session, results })
    }

    /// Session and its candidates, after the target sweep.
    pub async fn get_session(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        now: Timestamp,
    ) -> Result<SessionDetails, VotingError> {
        let session = self.sweep.close_if_expired(uow, session_id, now).await?;
        let restaurants = self.membership.describe(uow, session_id).await?;
        Ok(SessionDetails {
            session,
            restaurants,
        })
    }

    /// Page through sessions, newest first, after a global sweep.
    pub async fn list_sessions(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        status: Option<VoteSessionStatus>,
        creator_id: Option<UserId>,
        page: PageRequest,
        now: Timestamp,
    ) -> Result<Page<VoteSession>, VotingError> {
        self.sweep.close_all_expired(uow, now).await?;
        let filter = SessionListFilter {
            status,
            creator_id,
            page,
        };
        Ok(uow.list_sessions(&filter).await?)
    }

    /// Close every expired Active session.
    pub async fn check_auto_close(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        now: Timestamp,
    ) -> Result<Vec<VoteSessionId>, VotingError> {
        self.sweep.close_all_expired(uow, now).await
    }

    pub fn rules(&self) -> &VotingRules {
        &self.rules
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn lock(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
    ) -> Result<VoteSession, VotingError> {
        uow.load_session(session_id, RowLock::Update)
            .await?
            .ok_or(VotingError::SessionNotFound(*session_id))
    }

    async fn lock_for_membership(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        requester: &UserId,
        now: Timestamp,
    ) -> Result<VoteSession, VotingError> {
        self.sweep.close_if_expired(uow, session_id, now).await?;
        let session = self.lock(uow, session_id).await?;
        session.authorize(requester)?;
        session.ensure_draft()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVotingStore;
    use crate::application::voting::test_support::{
        active_session, begin, lifecycle, new_session, registry, user,
    };
    use crate::application::voting::VoteLedger;

    fn ids(raw: &[i64]) -> Vec<RestaurantId> {
        raw.iter().map(|id| RestaurantId::new(*id)).collect()
    }

    async fn draft(store: &InMemoryVotingStore, lifecycle: &SessionLifecycle) -> VoteSessionId {
        let mut uow = begin(store).await;
        let session = lifecycle
            .create(uow.as_mut(), user(1), new_session(None), Timestamp::now())
            .await
            .unwrap();
        uow.commit().await.unwrap();
        *session.id()
    }

    #[tokio::test]
    async fn create_uses_default_budget() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let mut uow = begin(&store).await;

        let session = lifecycle
            .create(
                uow.as_mut(),
                user(1),
                NewSession {
                    votes_per_user: None,
                    ..new_session(None)
                },
                Timestamp::now(),
            )
            .await
            .unwrap();
        assert_eq!(session.votes_per_user(), 3);
        assert_eq!(session.status(), VoteSessionStatus::Draft);
    }

    #[tokio::test]
    async fn create_rejects_budget_above_maximum() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let mut uow = begin(&store).await;

        let err = lifecycle
            .create(
                uow.as_mut(),
                user(1),
                NewSession {
                    votes_per_user: Some(11),
                    ..new_session(None)
                },
                Timestamp::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::ValidationFailed { field, .. } if field == "votes_per_user"));
    }

    #[tokio::test]
    async fn membership_changes_require_creator() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let id = draft(&store, &lifecycle).await;
        let mut uow = begin(&store).await;

        let err = lifecycle
            .add_restaurants(uow.as_mut(), &id, &user(2), &ids(&[1]), Timestamp::now())
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::Forbidden(_)));
    }

    #[tokio::test]
    async fn membership_changes_rejected_once_active() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let now = Timestamp::now();
        let id = active_session(&store, &lifecycle, None, now).await;
        let mut uow = begin(&store).await;

        let err = lifecycle
            .add_restaurants(uow.as_mut(), &id, &user(1), &ids(&[3]), now)
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::InvalidState(_)));

        let err = lifecycle
            .remove_restaurants(uow.as_mut(), &id, &user(1), &ids(&[1]), now)
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn start_without_members_fails() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let id = draft(&store, &lifecycle).await;
        let mut uow = begin(&store).await;

        let err = lifecycle
            .start(uow.as_mut(), &id, &user(1), Timestamp::now())
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn start_after_members_removed_fails() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let id = draft(&store, &lifecycle).await;
        let now = Timestamp::now();
        let mut uow = begin(&store).await;
        lifecycle
            .add_restaurants(uow.as_mut(), &id, &user(1), &ids(&[1]), now)
            .await
            .unwrap();
        let remaining = lifecycle
            .remove_restaurants(uow.as_mut(), &id, &user(1), &ids(&[1]), now)
            .await
            .unwrap();
        assert!(remaining.is_empty());

        let err = lifecycle.start(uow.as_mut(), &id, &user(1), now).await.unwrap_err();
        assert!(matches!(err, VotingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn start_unknown_session_is_not_found() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let mut uow = begin(&store).await;
        let id = VoteSessionId::new();

        let err = lifecycle
            .start(uow.as_mut(), &id, &user(1), Timestamp::now())
            .await
            .unwrap_err();
        assert_eq!(err, VotingError::SessionNotFound(id));
    }

    #[tokio::test]
    async fn end_with_zero_votes_has_no_winner() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let now = Timestamp::now();
        let id = active_session(&store, &lifecycle, None, now).await;
        let mut uow = begin(&store).await;

        let outcome = lifecycle.end(uow.as_mut(), &id, &user(1), now).await.unwrap();
        assert_eq!(outcome.session.status(), VoteSessionStatus::Closed);
        assert!(outcome.winner().is_none());
    }

    #[tokio::test]
    async fn end_reports_the_winner() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let ledger = VoteLedger::new(VotingRules::default().weight_schedule);
        let now = Timestamp::now();
        let id = active_session(&store, &lifecycle, None, now).await;
        let mut uow = begin(&store).await;
        ledger
            .cast(uow.as_mut(), &id, &user(5), &RestaurantId::new(2), now)
            .await
            .unwrap();

        let outcome = lifecycle.end(uow.as_mut(), &id, &user(1), now).await.unwrap();
        assert_eq!(outcome.winner(), Some(RestaurantId::new(2)));
        assert_eq!(outcome.results.total_votes, 1.0);
    }

    #[tokio::test]
    async fn end_by_non_creator_is_forbidden() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let now = Timestamp::now();
        let id = active_session(&store, &lifecycle, None, now).await;
        let mut uow = begin(&store).await;

        let err = lifecycle.end(uow.as_mut(), &id, &user(9), now).await.unwrap_err();
        assert!(matches!(err, VotingError::Forbidden(_)));
    }

    #[tokio::test]
    async fn end_after_deadline_is_invalid_state_and_sweep_closes() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let now = Timestamp::now();
        let id = active_session(&store, &lifecycle, Some(now.plus_secs(60)), now).await;
        let later = now.plus_secs(120);
        let mut uow = begin(&store).await;

        let err = lifecycle.end(uow.as_mut(), &id, &user(1), later).await.unwrap_err();
        assert!(matches!(err, VotingError::InvalidState(_)));

        let session = uow.load_session(&id, RowLock::None).await.unwrap().unwrap();
        assert_eq!(session.status(), VoteSessionStatus::Closed);
        assert_eq!(session.ended_at(), Some(&later));
    }

    #[tokio::test]
    async fn get_session_includes_members() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let now = Timestamp::now();
        let id = active_session(&store, &lifecycle, None, now).await;
        let mut uow = begin(&store).await;

        let details = lifecycle.get_session(uow.as_mut(), &id, now).await.unwrap();
        let names: Vec<_> = details
            .restaurants
            .iter()
            .map(|r| r.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Pho House", "Taco Stand"]);
    }

    #[tokio::test]
    async fn list_sessions_sweeps_before_filtering() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let now = Timestamp::now();
        active_session(&store, &lifecycle, Some(now.plus_secs(30)), now).await;
        let still_open = active_session(&store, &lifecycle, None, now).await;
        let mut uow = begin(&store).await;

        let page = lifecycle
            .list_sessions(
                uow.as_mut(),
                Some(VoteSessionStatus::Active),
                None,
                PageRequest::new(0, 10),
                now.plus_secs(60),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id(), &still_open);
    }

    #[tokio::test]
    async fn update_details_after_close_is_invalid_state() {
        let store = InMemoryVotingStore::new();
        let lifecycle = lifecycle(registry());
        let now = Timestamp::now();
        let id = active_session(&store, &lifecycle, None, now).await;
        let mut uow = begin(&store).await;
        lifecycle.end(uow.as_mut(), &id, &user(1), now).await.unwrap();

        let err = lifecycle
            .update_details(
                uow.as_mut(),
                &id,
                &user(1),
                SessionDetailsUpdate {
                    title: Some("Too late".to_string()),
                    ..Default::default()
                },
                now,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::InvalidState(_)));
    }
}
