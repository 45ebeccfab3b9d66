//! HTTP routes for vote session endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    add_restaurants, cast_vote, create_session, end_session, get_results, get_session,
    list_sessions, my_votes, remove_restaurants, session_votes, start_session, sweep_expired,
    update_session, VoteSessionHandlers,
};

/// Creates the vote session router, to be nested under `/api/vote-sessions`.
pub fn vote_session_routes(handlers: VoteSessionHandlers) -> Router {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/maintenance/auto-close", post(sweep_expired))
        .route("/:id", get(get_session).patch(update_session))
        .route(
            "/:id/restaurants",
            post(add_restaurants).delete(remove_restaurants),
        )
        .route("/:id/start", post(start_session))
        .route("/:id/end", post(end_session))
        .route("/:id/votes", post(cast_vote).get(session_votes))
        .route("/:id/votes/mine", get(my_votes))
        .route("/:id/results", get(get_results))
        .with_state(handlers)
}
