//! HTTP DTOs for vote session endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::application::voting::{CastOutcome, EndSessionOutcome, MemberRestaurant, SessionDetails, UserVotes};
use crate::domain::foundation::{Timestamp, VoteSessionId, VoteSessionStatus};
use crate::domain::voting::{RestaurantTally, SessionResults, VoteRecord, VoteSession, VotingError};
use crate::ports::Page;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to create a vote session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVoteSessionRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub votes_per_user: Option<u32>,
    #[serde(default)]
    pub auto_close_at: Option<DateTime<Utc>>,
}

/// Partial update of session details.
///
/// An absent field is left unchanged; an explicit `null` clears
/// `description` or `auto_close_at`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVoteSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub auto_close_at: Option<Option<DateTime<Utc>>>,
}

/// Restaurants to add to or remove from a session.
#[derive(Debug, Clone, Deserialize)]
pub struct RestaurantIdsRequest {
    pub restaurant_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastVoteRequest {
    pub restaurant_id: i64,
}

/// Query parameters for listing sessions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListVoteSessionsParams {
    #[serde(default)]
    pub status: Option<VoteSessionStatus>,
    #[serde(default)]
    pub mine: bool,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct VoteSessionResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: VoteSessionStatus,
    pub creator_id: i64,
    pub votes_per_user: u32,
    pub auto_close_at: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub updated_at: String,
}

impl From<&VoteSession> for VoteSessionResponse {
    fn from(session: &VoteSession) -> Self {
        Self {
            id: session.id().to_string(),
            title: session.title().to_string(),
            description: session.description().map(str::to_string),
            status: session.status(),
            creator_id: session.creator_id().as_i64(),
            votes_per_user: session.votes_per_user(),
            auto_close_at: session.auto_close_at().map(Timestamp::to_rfc3339),
            created_at: session.created_at().to_rfc3339(),
            started_at: session.started_at().map(Timestamp::to_rfc3339),
            ended_at: session.ended_at().map(Timestamp::to_rfc3339),
            updated_at: session.updated_at().to_rfc3339(),
        }
    }
}

/// Session with its candidate restaurants.
#[derive(Debug, Clone, Serialize)]
pub struct VoteSessionDetailResponse {
    #[serde(flatten)]
    pub session: VoteSessionResponse,
    pub restaurants: Vec<MemberRestaurant>,
}

impl From<SessionDetails> for VoteSessionDetailResponse {
    fn from(details: SessionDetails) -> Self {
        Self {
            session: VoteSessionResponse::from(&details.session),
            restaurants: details.restaurants,
        }
    }
}

/// One page of items.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl<T> PageResponse<T> {
    pub fn from_page<S>(page: Page<S>, f: impl FnMut(S) -> T) -> Self {
        let has_more = page.has_more();
        let page = page.map(f);
        Self {
            items: page.items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
            has_more,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipResponse {
    pub session_id: String,
    pub restaurant_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteResponse {
    pub id: String,
    pub session_id: String,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub sequence: u32,
    pub weight: f64,
    pub voted_at: String,
}

impl From<&VoteRecord> for VoteResponse {
    fn from(vote: &VoteRecord) -> Self {
        Self {
            id: vote.id().to_string(),
            session_id: vote.session_id().to_string(),
            user_id: vote.user_id().as_i64(),
            restaurant_id: vote.restaurant_id().as_i64(),
            sequence: vote.sequence(),
            weight: vote.weight(),
            voted_at: vote.voted_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CastVoteResponse {
    pub vote: VoteResponse,
    pub remaining_votes: u32,
}

impl From<CastOutcome> for CastVoteResponse {
    fn from(outcome: CastOutcome) -> Self {
        Self {
            vote: VoteResponse::from(&outcome.vote),
            remaining_votes: outcome.remaining_votes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MyVotesResponse {
    pub session_id: String,
    pub votes_per_user: u32,
    pub remaining_votes: u32,
    pub votes: Vec<VoteResponse>,
}

impl From<UserVotes> for MyVotesResponse {
    fn from(mine: UserVotes) -> Self {
        Self {
            session_id: mine.session_id.to_string(),
            votes_per_user: mine.votes_per_user,
            remaining_votes: mine.remaining_votes,
            votes: mine.votes.iter().map(VoteResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsResponse {
    pub session_id: String,
    pub status: VoteSessionStatus,
    pub total_votes: f64,
    pub winner: Option<i64>,
    pub tallies: Vec<RestaurantTally>,
}

impl From<SessionResults> for ResultsResponse {
    fn from(results: SessionResults) -> Self {
        Self {
            session_id: results.session_id.to_string(),
            status: results.status,
            total_votes: results.total_votes,
            winner: results.winner().map(|t| t.restaurant_id.as_i64()),
            tallies: results.tallies,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndSessionResponse {
    pub session: VoteSessionResponse,
    pub results: ResultsResponse,
}

impl From<EndSessionOutcome> for EndSessionResponse {
    fn from(outcome: EndSessionOutcome) -> Self {
        Self {
            session: VoteSessionResponse::from(&outcome.session),
            results: ResultsResponse::from(outcome.results),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub closed_session_ids: Vec<String>,
}

impl From<Vec<VoteSessionId>> for SweepResponse {
    fn from(ids: Vec<VoteSessionId>) -> Self {
        Self {
            closed_session_ids: ids.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Error body returned by every vote session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "VALIDATION_FAILED".to_string(),
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<&VotingError> for ErrorResponse {
    fn from(error: &VotingError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.message(),
            retryable: error.is_retryable(),
        }
    }
}
