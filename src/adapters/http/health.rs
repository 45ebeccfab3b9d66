//! Health endpoints for load balancers and orchestrators.
//!
//! - `GET /health` - process is up
//! - `GET /health/ready` - database reachable, 503 otherwise
//! - `GET /health/live` - liveness, no dependencies checked
//!
//! None of these require a user header.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::ports::HealthCheck;

const SERVICE: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct HealthState {
    check: Arc<dyn HealthCheck>,
    environment: &'static str,
}

impl HealthState {
    pub fn new(check: Arc<dyn HealthCheck>, environment: &'static str) -> Self {
        Self { check, environment }
    }
}

pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/health/live", get(live))
        .with_state(state)
}

async fn health(State(state): State<HealthState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE,
        "version": VERSION,
        "environment": state.environment,
    }))
}

async fn ready(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    match state.check.ping_database().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": SERVICE,
                "version": VERSION,
                "environment": state.environment,
                "checks": { "database": "healthy" },
            })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "service": SERVICE,
                    "version": VERSION,
                    "environment": state.environment,
                    "checks": { "database": "unhealthy" },
                })),
            )
        }
    }
}

async fn live() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "service": SERVICE,
        "version": VERSION,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVotingStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_service_and_environment() {
        let store = Arc::new(InMemoryVotingStore::new());
        let router = health_routes(HealthState::new(store, "staging"));

        let (status, body) = get_json(router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "lunch-vote");
        assert_eq!(body["environment"], "staging");
    }

    #[tokio::test]
    async fn ready_turns_unavailable_when_database_is_down() {
        let store = Arc::new(InMemoryVotingStore::new());
        let router = health_routes(HealthState::new(store.clone(), "development"));

        let (status, body) = get_json(router.clone(), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["database"], "healthy");

        store.set_fail_writes(true);
        let (status, body) = get_json(router.clone(), "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["database"], "unhealthy");

        let (status, body) = get_json(router, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alive");
    }
}
