//! HTTP adapter for vote session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CastVoteRequest, CastVoteResponse, CreateVoteSessionRequest, EndSessionResponse,
    ErrorResponse, ListVoteSessionsParams, MembershipResponse, MyVotesResponse, PageParams,
    PageResponse, RestaurantIdsRequest, ResultsResponse, SweepResponse, UpdateVoteSessionRequest,
    VoteResponse, VoteSessionDetailResponse, VoteSessionResponse,
};
pub use handlers::VoteSessionHandlers;
pub use routes::vote_session_routes;
