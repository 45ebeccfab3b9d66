//! HTTP adapters - REST API implementations.

pub mod health;
pub mod middleware;
pub mod vote_session;

use std::time::Duration;

use axum::Router;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use health::{health_routes, HealthState};
pub use vote_session::{vote_session_routes, VoteSessionHandlers};

/// Full application router with request tracing and a request timeout.
pub fn app_router(
    handlers: VoteSessionHandlers,
    health: HealthState,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .nest("/api/vote-sessions", vote_session_routes(handlers))
        .merge(health_routes(health))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
