//! Voting store port (transactional persistence).
//!
//! Every vote session operation runs inside one `VotingUnitOfWork`, which
//! bundles the session, membership and vote repositories over a single
//! transaction. Handlers open it with `VotingStore::begin` and finish it with
//! `commit` or `rollback`.
//!
//! # Concurrency
//!
//! - `RowLock::Update` serializes lifecycle changes on a session
//! - `RowLock::Share` lets casts by different users proceed in parallel while
//!   blocking a concurrent close
//! - the unique `(session, user, sequence)` key settles same-user races;
//!   `insert_vote` reports a lost race as `ErrorCode::ConstraintViolation`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, RestaurantId, Timestamp, UserId, VoteSessionId, VoteSessionStatus,
};
use crate::domain::voting::{VoteRecord, VoteSession};

/// Row lock taken when loading a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    None,
    Share,
    Update,
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matching rows.
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    /// Whether rows exist past this page.
    pub fn has_more(&self) -> bool {
        (self.offset as u64) + (self.items.len() as u64) < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Filter for listing sessions, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionListFilter {
    pub status: Option<VoteSessionStatus>,
    pub creator_id: Option<UserId>,
    pub page: PageRequest,
}

/// Session rows.
#[async_trait]
pub trait VoteSessionRepository: Send {
    /// Insert a new session.
    async fn insert_session(&mut self, session: &VoteSession) -> Result<(), DomainError>;

    /// Persist changes to an existing session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn update_session(&mut self, session: &VoteSession) -> Result<(), DomainError>;

    /// Load a session, optionally locking its row for the rest of the unit of work.
    async fn load_session(
        &mut self,
        id: &VoteSessionId,
        lock: RowLock,
    ) -> Result<Option<VoteSession>, DomainError>;

    /// Active sessions whose `auto_close_at` is at or before `now`, locked for update.
    ///
    /// Waits for rows locked by another unit of work (a cast holding a share
    /// lock, a concurrent close) so no expired session is left Active; rows
    /// closed meanwhile drop out of the result.
    async fn expired_active_sessions(
        &mut self,
        now: &Timestamp,
    ) -> Result<Vec<VoteSession>, DomainError>;

    /// Page through sessions, newest first.
    async fn list_sessions(
        &mut self,
        filter: &SessionListFilter,
    ) -> Result<Page<VoteSession>, DomainError>;
}

/// Session to candidate restaurant links.
#[async_trait]
pub trait MembershipRepository: Send {
    /// Candidate restaurant ids, ascending.
    async fn member_ids(
        &mut self,
        session_id: &VoteSessionId,
    ) -> Result<Vec<RestaurantId>, DomainError>;

    async fn is_member(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_id: &RestaurantId,
    ) -> Result<bool, DomainError>;

    /// Link restaurants. Existing links are left untouched.
    async fn add_members(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_ids: &[RestaurantId],
    ) -> Result<(), DomainError>;

    /// Unlink restaurants. Ids that are not linked are ignored.
    async fn remove_members(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_ids: &[RestaurantId],
    ) -> Result<(), DomainError>;
}

/// Append-only vote records.
#[async_trait]
pub trait VoteRepository: Send {
    async fn count_votes_by_user(
        &mut self,
        session_id: &VoteSessionId,
        user_id: &UserId,
    ) -> Result<u32, DomainError>;

    /// Append a vote.
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation` if the user's sequence slot is already taken
    /// - `DatabaseError` on persistence failure
    async fn insert_vote(&mut self, vote: &VoteRecord) -> Result<(), DomainError>;

    /// All votes of a session.
    async fn votes_for_session(
        &mut self,
        session_id: &VoteSessionId,
    ) -> Result<Vec<VoteRecord>, DomainError>;

    /// One user's votes in sequence order.
    async fn votes_by_user(
        &mut self,
        session_id: &VoteSessionId,
        user_id: &UserId,
    ) -> Result<Vec<VoteRecord>, DomainError>;

    /// Page through a session's votes in casting order.
    async fn list_votes(
        &mut self,
        session_id: &VoteSessionId,
        page: &PageRequest,
    ) -> Result<Page<VoteRecord>, DomainError>;
}

/// Transaction boundary for vote session operations.
#[async_trait]
pub trait VotingUnitOfWork: VoteSessionRepository + MembershipRepository + VoteRepository + Send {
    /// Make every write of this unit of work visible.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discard every write of this unit of work.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

/// Factory for units of work.
#[async_trait]
pub trait VotingStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn VotingUnitOfWork>, DomainError>;
}
