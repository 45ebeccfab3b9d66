//! HTTP handlers for vote session endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireUser;
use crate::application::handlers::vote_session::{
    AddRestaurantsCommand, AddRestaurantsHandler, CastVoteCommand, CastVoteHandler,
    CreateSessionCommand, CreateSessionHandler, EndSessionCommand, EndSessionHandler,
    GetResultsHandler, GetResultsQuery, GetSessionHandler, GetSessionQuery, ListMyVotesHandler,
    ListMyVotesQuery, ListSessionVotesHandler, ListSessionVotesQuery, ListSessionsHandler,
    ListSessionsQuery, RemoveRestaurantsCommand, RemoveRestaurantsHandler, SessionScope,
    StartSessionCommand, StartSessionHandler, SweepExpiredHandler, UpdateSessionCommand,
    UpdateSessionHandler,
};
use crate::application::voting::{
    AutoCloseSweep, ResultAggregator, SessionLifecycle, VoteLedger, VotingRules,
};
use crate::domain::foundation::{
    CommandMetadata, RestaurantId, Timestamp, UserId, VoteSessionId, VoteSessionStatus,
};
use crate::domain::voting::{SessionDetailsUpdate, VotingError};
use crate::ports::{Clock, RestaurantRegistry, VotingStore};

use super::dto::{
    CastVoteRequest, CastVoteResponse, CreateVoteSessionRequest, EndSessionResponse,
    ErrorResponse, ListVoteSessionsParams, MembershipResponse, MyVotesResponse, PageParams,
    PageResponse, RestaurantIdsRequest, ResultsResponse, SweepResponse,
    UpdateVoteSessionRequest, VoteResponse, VoteSessionDetailResponse, VoteSessionResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct VoteSessionHandlers {
    create_handler: Arc<CreateSessionHandler>,
    update_handler: Arc<UpdateSessionHandler>,
    add_restaurants_handler: Arc<AddRestaurantsHandler>,
    remove_restaurants_handler: Arc<RemoveRestaurantsHandler>,
    start_handler: Arc<StartSessionHandler>,
    end_handler: Arc<EndSessionHandler>,
    get_handler: Arc<GetSessionHandler>,
    list_handler: Arc<ListSessionsHandler>,
    cast_vote_handler: Arc<CastVoteHandler>,
    my_votes_handler: Arc<ListMyVotesHandler>,
    session_votes_handler: Arc<ListSessionVotesHandler>,
    results_handler: Arc<GetResultsHandler>,
    sweep_handler: Arc<SweepExpiredHandler>,
}

impl VoteSessionHandlers {
    /// Wire every handler over the given adapters.
    pub fn new(
        store: Arc<dyn VotingStore>,
        registry: Arc<dyn RestaurantRegistry>,
        rules: VotingRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lifecycle = Arc::new(SessionLifecycle::new(registry.clone(), rules.clone()));
        let ledger = Arc::new(VoteLedger::new(rules.weight_schedule.clone()));
        let results = Arc::new(ResultAggregator::new(registry, AutoCloseSweep::new()));

        Self {
            create_handler: Arc::new(CreateSessionHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            update_handler: Arc::new(UpdateSessionHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            add_restaurants_handler: Arc::new(AddRestaurantsHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            remove_restaurants_handler: Arc::new(RemoveRestaurantsHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            start_handler: Arc::new(StartSessionHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            end_handler: Arc::new(EndSessionHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            get_handler: Arc::new(GetSessionHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            list_handler: Arc::new(ListSessionsHandler::new(
                store.clone(),
                lifecycle.clone(),
                clock.clone(),
            )),
            cast_vote_handler: Arc::new(CastVoteHandler::new(
                store.clone(),
                ledger.clone(),
                clock.clone(),
            )),
            my_votes_handler: Arc::new(ListMyVotesHandler::new(
                store.clone(),
                ledger.clone(),
                clock.clone(),
            )),
            session_votes_handler: Arc::new(ListSessionVotesHandler::new(
                store.clone(),
                ledger,
                rules,
                clock.clone(),
            )),
            results_handler: Arc::new(GetResultsHandler::new(
                store.clone(),
                results,
                clock.clone(),
            )),
            sweep_handler: Arc::new(SweepExpiredHandler::new(store, lifecycle, clock)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/vote-sessions - Create a session in Draft
pub async fn create_session(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Json(req): Json<CreateVoteSessionRequest>,
) -> Response {
    let cmd = CreateSessionCommand {
        title: req.title,
        description: req.description,
        votes_per_user: req.votes_per_user,
        auto_close_at: req.auto_close_at.map(Timestamp::from_datetime),
    };

    match handlers.create_handler.handle(cmd, metadata(user)).await {
        Ok(session) => (
            StatusCode::CREATED,
            Json(VoteSessionResponse::from(&session)),
        )
            .into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// GET /api/vote-sessions - List sessions, newest first
pub async fn list_sessions(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Query(params): Query<ListVoteSessionsParams>,
) -> Response {
    let scope = match (params.mine, params.status) {
        (true, _) => SessionScope::Mine,
        (false, Some(VoteSessionStatus::Active)) => SessionScope::Active,
        (false, None) => SessionScope::All,
        (false, Some(other)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(format!(
                    "Unsupported status filter: {}",
                    other.as_str()
                ))),
            )
                .into_response()
        }
    };

    let query = ListSessionsQuery {
        user_id: user,
        scope,
        offset: params.offset,
        limit: params.limit,
    };

    match handlers.list_handler.handle(query).await {
        Ok(page) => {
            let response = PageResponse::from_page(page, |s| VoteSessionResponse::from(&s));
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_voting_error(e),
    }
}

/// GET /api/vote-sessions/:id - Session with its candidate restaurants
pub async fn get_session(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(_user): RequireUser,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.get_handler.handle(GetSessionQuery { session_id }).await {
        Ok(details) => (
            StatusCode::OK,
            Json(VoteSessionDetailResponse::from(details)),
        )
            .into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// PATCH /api/vote-sessions/:id - Edit title, description or deadline
pub async fn update_session(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Path(session_id): Path<String>,
    Json(req): Json<UpdateVoteSessionRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = UpdateSessionCommand {
        session_id,
        update: SessionDetailsUpdate {
            title: req.title,
            description: req.description,
            auto_close_at: req
                .auto_close_at
                .map(|at| at.map(Timestamp::from_datetime)),
        },
    };

    match handlers.update_handler.handle(cmd, metadata(user)).await {
        Ok(session) => (StatusCode::OK, Json(VoteSessionResponse::from(&session))).into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// POST /api/vote-sessions/:id/restaurants - Add candidate restaurants
pub async fn add_restaurants(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Path(session_id): Path<String>,
    Json(req): Json<RestaurantIdsRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = AddRestaurantsCommand {
        session_id,
        restaurant_ids: restaurant_ids(&req),
    };

    match handlers.add_restaurants_handler.handle(cmd, metadata(user)).await {
        Ok(members) => membership_response(session_id, members),
        Err(e) => handle_voting_error(e),
    }
}

/// DELETE /api/vote-sessions/:id/restaurants - Remove candidate restaurants
pub async fn remove_restaurants(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Path(session_id): Path<String>,
    Json(req): Json<RestaurantIdsRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = RemoveRestaurantsCommand {
        session_id,
        restaurant_ids: restaurant_ids(&req),
    };

    match handlers.remove_restaurants_handler.handle(cmd, metadata(user)).await {
        Ok(members) => membership_response(session_id, members),
        Err(e) => handle_voting_error(e),
    }
}

/// POST /api/vote-sessions/:id/start - Open the session for votes
pub async fn start_session(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .start_handler
        .handle(StartSessionCommand { session_id }, metadata(user))
        .await
    {
        Ok(session) => (StatusCode::OK, Json(VoteSessionResponse::from(&session))).into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// POST /api/vote-sessions/:id/end - Close the session and report the winner
pub async fn end_session(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .end_handler
        .handle(EndSessionCommand { session_id }, metadata(user))
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(EndSessionResponse::from(outcome))).into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// POST /api/vote-sessions/:id/votes - Cast one vote
pub async fn cast_vote(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Path(session_id): Path<String>,
    Json(req): Json<CastVoteRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = CastVoteCommand {
        session_id,
        restaurant_id: RestaurantId::new(req.restaurant_id),
    };

    match handlers.cast_vote_handler.handle(cmd, metadata(user)).await {
        Ok(outcome) => (StatusCode::CREATED, Json(CastVoteResponse::from(outcome))).into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// GET /api/vote-sessions/:id/votes/mine - The caller's votes and remaining budget
pub async fn my_votes(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(user): RequireUser,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let query = ListMyVotesQuery {
        session_id,
        user_id: user,
    };

    match handlers.my_votes_handler.handle(query).await {
        Ok(mine) => (StatusCode::OK, Json(MyVotesResponse::from(mine))).into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// GET /api/vote-sessions/:id/votes - Every vote, in casting order
pub async fn session_votes(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(_user): RequireUser,
    Path(session_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let query = ListSessionVotesQuery {
        session_id,
        offset: params.offset,
        limit: params.limit,
    };

    match handlers.session_votes_handler.handle(query).await {
        Ok(page) => {
            let response = PageResponse::from_page(page, |v| VoteResponse::from(&v));
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_voting_error(e),
    }
}

/// GET /api/vote-sessions/:id/results - Live weighted results
pub async fn get_results(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(_user): RequireUser,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .results_handler
        .handle(GetResultsQuery { session_id })
        .await
    {
        Ok(results) => (StatusCode::OK, Json(ResultsResponse::from(results))).into_response(),
        Err(e) => handle_voting_error(e),
    }
}

/// POST /api/vote-sessions/maintenance/auto-close - Close every expired session
pub async fn sweep_expired(
    State(handlers): State<VoteSessionHandlers>,
    RequireUser(_user): RequireUser,
) -> Response {
    match handlers.sweep_handler.handle().await {
        Ok(closed) => (StatusCode::OK, Json(SweepResponse::from(closed))).into_response(),
        Err(e) => handle_voting_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

fn metadata(user: UserId) -> CommandMetadata {
    CommandMetadata::new(user).with_source("http")
}

fn parse_session_id(raw: &str) -> Result<VoteSessionId, Response> {
    raw.parse::<VoteSessionId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Invalid session ID")),
        )
            .into_response()
    })
}

fn restaurant_ids(req: &RestaurantIdsRequest) -> Vec<RestaurantId> {
    req.restaurant_ids.iter().copied().map(RestaurantId::new).collect()
}

fn membership_response(session_id: VoteSessionId, members: Vec<RestaurantId>) -> Response {
    let response = MembershipResponse {
        session_id: session_id.to_string(),
        restaurant_ids: members.iter().map(|id| id.as_i64()).collect(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn error_status(error: &VotingError) -> StatusCode {
    match error {
        VotingError::SessionNotFound(_) | VotingError::RestaurantNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        VotingError::Forbidden(_) => StatusCode::FORBIDDEN,
        VotingError::InvalidState(_)
        | VotingError::BudgetExhausted { .. }
        | VotingError::ConstraintViolation(_) => StatusCode::CONFLICT,
        VotingError::NotMember { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        VotingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        VotingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn handle_voting_error(error: VotingError) -> Response {
    let status = error_status(&error);
    let mut body = ErrorResponse::from(&error);
    if let VotingError::Infrastructure(msg) = &error {
        tracing::error!("Vote session request failed: {}", msg);
        body.message = "Internal server error".to_string();
    }
    (status, Json(body)).into_response()
}
