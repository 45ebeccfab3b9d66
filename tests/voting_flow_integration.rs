//! Integration tests for the vote session flow.
//!
//! Drives the command and query handlers over the in-memory adapters:
//! 1. The weighted lunch scenario from creation to winner
//! 2. Two racing casts for the same vote slot, and edits or casts racing `end`
//! 3. Lazy auto-close observed by votes, reads and listings

use std::sync::Arc;

use lunch_vote::adapters::clock::ManualClock;
use lunch_vote::adapters::memory::{InMemoryRestaurantRegistry, InMemoryVotingStore};
use lunch_vote::application::handlers::vote_session::{
    AddRestaurantsCommand, AddRestaurantsHandler, CastVoteCommand, CastVoteHandler,
    CreateSessionCommand, CreateSessionHandler, EndSessionCommand, EndSessionHandler,
    GetResultsHandler, GetResultsQuery, ListSessionsHandler, ListSessionsQuery, SessionScope,
    StartSessionCommand, StartSessionHandler,
};
use lunch_vote::application::voting::{
    AutoCloseSweep, ResultAggregator, SessionLifecycle, VoteLedger, VotingRules,
};
use lunch_vote::domain::foundation::{
    CommandMetadata, ErrorCode, RestaurantId, Timestamp, UserId, VoteSessionId,
    VoteSessionStatus,
};
use lunch_vote::domain::voting::{SessionDetailsUpdate, VotingError};
use lunch_vote::ports::{Clock, VotingStore, VotingUnitOfWork};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct App {
    store: Arc<InMemoryVotingStore>,
    clock: Arc<ManualClock>,
    lifecycle: Arc<SessionLifecycle>,
    ledger: Arc<VoteLedger>,
    results: Arc<ResultAggregator>,
}

impl App {
    fn new() -> Self {
        let registry = Arc::new(InMemoryRestaurantRegistry::with_restaurants([
            (1, "Pho House"),
            (2, "Taco Stand"),
            (3, "Curry Corner"),
        ]));
        let rules = VotingRules::default();
        Self {
            store: Arc::new(InMemoryVotingStore::new()),
            clock: Arc::new(ManualClock::new(Timestamp::now())),
            lifecycle: Arc::new(SessionLifecycle::new(registry.clone(), rules.clone())),
            ledger: Arc::new(VoteLedger::new(rules.weight_schedule)),
            results: Arc::new(ResultAggregator::new(registry, AutoCloseSweep::new())),
        }
    }

    fn user(id: i64) -> CommandMetadata {
        CommandMetadata::new(UserId::new(id).unwrap())
    }

    async fn open_session(&self, auto_close_in_secs: Option<i64>) -> VoteSessionId {
        let session = CreateSessionHandler::new(
            self.store.clone(),
            self.lifecycle.clone(),
            self.clock.clone(),
        )
        .handle(
            CreateSessionCommand {
                title: "Team lunch".to_string(),
                description: Some("Pick before noon".to_string()),
                votes_per_user: Some(3),
                auto_close_at: auto_close_in_secs.map(|s| self.clock.now().plus_secs(s)),
            },
            Self::user(1),
        )
        .await
        .unwrap();
        let id = *session.id();

        AddRestaurantsHandler::new(self.store.clone(), self.lifecycle.clone(), self.clock.clone())
            .handle(
                AddRestaurantsCommand {
                    session_id: id,
                    restaurant_ids: vec![RestaurantId::new(1), RestaurantId::new(2)],
                },
                Self::user(1),
            )
            .await
            .unwrap();
        StartSessionHandler::new(self.store.clone(), self.lifecycle.clone(), self.clock.clone())
            .handle(StartSessionCommand { session_id: id }, Self::user(1))
            .await
            .unwrap();
        id
    }

    async fn cast(
        &self,
        session_id: VoteSessionId,
        user: i64,
        restaurant: i64,
    ) -> Result<lunch_vote::application::voting::CastOutcome, VotingError> {
        CastVoteHandler::new(self.store.clone(), self.ledger.clone(), self.clock.clone())
            .handle(
                CastVoteCommand {
                    session_id,
                    restaurant_id: RestaurantId::new(restaurant),
                },
                Self::user(user),
            )
            .await
    }
}

// =============================================================================
// Scenario
// =============================================================================

#[tokio::test]
async fn weighted_lunch_scenario_picks_the_expected_winner() {
    let app = App::new();
    let id = app.open_session(None).await;

    let mut slots = Vec::new();
    for restaurant in [1, 2, 1] {
        let outcome = app.cast(id, 7, restaurant).await.unwrap();
        slots.push((outcome.vote.sequence(), outcome.vote.weight()));
    }
    assert_eq!(slots, vec![(1, 1.0), (2, 0.5), (3, 0.25)]);

    let ended = EndSessionHandler::new(app.store.clone(), app.lifecycle.clone(), app.clock.clone())
        .handle(EndSessionCommand { session_id: id }, App::user(1))
        .await
        .unwrap();

    assert_eq!(ended.session.status(), VoteSessionStatus::Closed);
    assert_eq!(ended.results.total_votes, 1.75);
    assert_eq!(ended.results.tallies[0].weighted_votes, 1.25);
    assert_eq!(ended.results.tallies[0].distinct_voters, 1);
    assert_eq!(ended.results.tallies[1].weighted_votes, 0.5);
    assert_eq!(ended.winner(), Some(RestaurantId::new(1)));
}

#[tokio::test]
async fn fourth_vote_exhausts_budget_and_fourth_weight_repeats_last_entry() {
    let app = App::new();
    let id = app.open_session(None).await;
    for _ in 0..3 {
        app.cast(id, 7, 2).await.unwrap();
    }

    let err = app.cast(id, 7, 2).await.unwrap_err();
    assert_eq!(err, VotingError::BudgetExhausted { votes_per_user: 3 });
    assert_eq!(app.store.votes(&id).await.len(), 3);

    // Weight for the 4th slot, if the budget allowed it.
    assert_eq!(app.ledger.schedule().weight_for(4), 0.25);
}

#[tokio::test]
async fn total_votes_equals_sum_of_recorded_weights() {
    let app = App::new();
    let id = app.open_session(None).await;
    for (user, restaurant) in [(3, 1), (3, 2), (4, 2), (5, 1), (5, 1), (5, 2)] {
        app.cast(id, user, restaurant).await.unwrap();
    }

    let results = GetResultsHandler::new(app.store.clone(), app.results.clone(), app.clock.clone())
        .handle(GetResultsQuery { session_id: id })
        .await
        .unwrap();
    let recorded: f64 = app.store.votes(&id).await.iter().map(|v| v.weight()).sum();
    assert!((results.total_votes - recorded).abs() < 1e-9);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn racing_casts_for_the_same_slot_persist_exactly_one_vote() {
    let app = App::new();
    let id = app.open_session(None).await;
    app.cast(id, 7, 1).await.unwrap();

    let user = UserId::new(7).unwrap();
    let now = app.clock.now();
    let mut first = app.store.begin().await.unwrap();
    let mut second = app.store.begin().await.unwrap();

    let a = app
        .ledger
        .cast(first.as_mut(), &id, &user, &RestaurantId::new(1), now)
        .await
        .unwrap();
    let b = app
        .ledger
        .cast(second.as_mut(), &id, &user, &RestaurantId::new(2), now)
        .await
        .unwrap();
    assert_eq!(a.vote.sequence(), 2);
    assert_eq!(b.vote.sequence(), 2);

    first.commit().await.unwrap();
    let lost = second.commit().await.unwrap_err();
    assert_eq!(lost.code, ErrorCode::ConstraintViolation);
    assert!(VotingError::from(lost).is_retryable());

    let seconds: Vec<_> = app
        .store
        .votes(&id)
        .await
        .into_iter()
        .filter(|v| v.sequence() == 2)
        .collect();
    assert_eq!(seconds.len(), 1);
    assert_eq!(seconds[0].restaurant_id(), &RestaurantId::new(1));
}

#[tokio::test]
async fn edit_started_before_end_cannot_reopen_the_session() {
    let app = App::new();
    let id = app.open_session(None).await;
    let creator = UserId::new(1).unwrap();
    let now = app.clock.now();

    let mut editor = app.store.begin().await.unwrap();
    let mut ender = app.store.begin().await.unwrap();
    app.lifecycle
        .end(ender.as_mut(), &id, &creator, now)
        .await
        .unwrap();
    ender.commit().await.unwrap();

    let update = SessionDetailsUpdate {
        title: Some("Late rename".to_string()),
        ..Default::default()
    };
    app.lifecycle
        .update_details(editor.as_mut(), &id, &creator, update, now)
        .await
        .unwrap();
    let err = VotingError::from(editor.commit().await.unwrap_err());
    assert!(err.is_retryable());

    let stored = app.store.session(&id).await.unwrap();
    assert_eq!(stored.status(), VoteSessionStatus::Closed);
    assert_eq!(stored.title(), "Team lunch");
}

#[tokio::test]
async fn cast_started_before_end_is_not_recorded_in_the_closed_session() {
    let app = App::new();
    let id = app.open_session(None).await;
    let now = app.clock.now();

    let mut voter = app.store.begin().await.unwrap();
    let mut ender = app.store.begin().await.unwrap();
    app.ledger
        .cast(voter.as_mut(), &id, &UserId::new(7).unwrap(), &RestaurantId::new(1), now)
        .await
        .unwrap();
    let ended = app
        .lifecycle
        .end(ender.as_mut(), &id, &UserId::new(1).unwrap(), now)
        .await
        .unwrap();
    ender.commit().await.unwrap();
    assert_eq!(ended.winner(), None);

    let lost = voter.commit().await.unwrap_err();
    assert_eq!(lost.code, ErrorCode::ConstraintViolation);
    assert!(app.store.votes(&id).await.is_empty());

    // The retry sees the closed session.
    let err = app.cast(id, 7, 1).await.unwrap_err();
    assert!(matches!(err, VotingError::InvalidState(_)));
}

#[tokio::test]
async fn different_users_vote_independently() {
    let app = App::new();
    let id = app.open_session(None).await;

    let (a, b) = tokio::join!(app.cast(id, 10, 1), app.cast(id, 11, 1));
    assert_eq!(a.unwrap().vote.sequence(), 1);
    assert_eq!(b.unwrap().vote.sequence(), 1);
}

// =============================================================================
// Auto-close
// =============================================================================

#[tokio::test]
async fn vote_after_deadline_closes_session_first() {
    let app = App::new();
    let id = app.open_session(Some(120)).await;
    app.cast(id, 7, 1).await.unwrap();
    app.clock.advance_secs(121);

    let err = app.cast(id, 8, 1).await.unwrap_err();
    assert!(matches!(err, VotingError::InvalidState(_)));

    let stored = app.store.session(&id).await.unwrap();
    assert_eq!(stored.status(), VoteSessionStatus::Closed);
    assert_eq!(stored.ended_at(), Some(&app.clock.now()));
    assert_eq!(app.store.votes(&id).await.len(), 1);
}

#[tokio::test]
async fn listing_never_reports_an_expired_session_as_active() {
    let app = App::new();
    let expiring = app.open_session(Some(60)).await;
    let open = app.open_session(None).await;
    app.clock.advance_secs(60);

    let page = ListSessionsHandler::new(app.store.clone(), app.lifecycle.clone(), app.clock.clone())
        .handle(ListSessionsQuery {
            user_id: UserId::new(9).unwrap(),
            scope: SessionScope::Active,
            offset: None,
            limit: None,
        })
        .await
        .unwrap();

    let ids: Vec<_> = page.items.iter().map(|s| *s.id()).collect();
    assert_eq!(ids, vec![open]);
    assert_eq!(
        app.store.session(&expiring).await.unwrap().status(),
        VoteSessionStatus::Closed
    );
}

#[tokio::test]
async fn failing_storage_surfaces_infrastructure_error_and_keeps_state() {
    let app = App::new();
    let id = app.open_session(Some(30)).await;
    app.clock.advance_secs(31);
    app.store.set_fail_writes(true);

    let err = GetResultsHandler::new(app.store.clone(), app.results.clone(), app.clock.clone())
        .handle(GetResultsQuery { session_id: id })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DatabaseError);

    app.store.set_fail_writes(false);
    assert_eq!(
        app.store.session(&id).await.unwrap().status(),
        VoteSessionStatus::Active
    );
}
