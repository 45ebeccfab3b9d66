//! Caller identity extractor.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user's numeric id in the `X-User-Id` header; this extractor only parses it.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::UserId;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires a valid caller id.
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(IdentityRejection::Missing)?
            .to_str()
            .map_err(|_| IdentityRejection::Invalid)?;

        raw.parse::<UserId>()
            .map(RequireUser)
            .map_err(|_| IdentityRejection::Invalid)
    }
}

/// Rejection for missing or malformed caller ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRejection {
    Missing,
    Invalid,
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        let message = match self {
            IdentityRejection::Missing => "Missing X-User-Id header",
            IdentityRejection::Invalid => "X-User-Id must be a positive integer",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "code": "UNAUTHENTICATED",
                "message": message,
                "retryable": false
            })),
        )
            .into_response()
    }
}
