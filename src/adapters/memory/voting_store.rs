//! In-Memory Voting Store Adapter
//!
//! Units of work read from a snapshot taken at `begin` and stage their writes
//! until `commit`. Commit re-checks the `(session, user, sequence)` key against
//! what other units of work committed in the meantime, so a same-user race
//! behaves as it does against PostgreSQL.
//!
//! Row locks are checked optimistically: every session a unit of work writes or
//! reads under `RowLock::Share`/`RowLock::Update` must still match its snapshot
//! at commit. The first committer wins; later ones fail with
//! `ErrorCode::ConstraintViolation`, where PostgreSQL would have blocked.
//!
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    DomainError, ErrorCode, RestaurantId, Timestamp, UserId, VoteSessionId,
};
use crate::domain::voting::{VoteRecord, VoteSession};
use crate::ports::{
    HealthCheck, MembershipRepository, Page, PageRequest, RowLock, SessionListFilter, VoteRepository,
    VoteSessionRepository, VotingStore, VotingUnitOfWork,
};

#[derive(Debug, Clone, Default)]
struct VotingTables {
    sessions: HashMap<VoteSessionId, VoteSession>,
    members: HashMap<VoteSessionId, BTreeSet<RestaurantId>>,
    votes: Vec<VoteRecord>,
}

impl VotingTables {
    fn slot_taken(&self, vote: &VoteRecord) -> bool {
        self.votes.iter().any(|v| {
            v.session_id() == vote.session_id()
                && v.user_id() == vote.user_id()
                && v.sequence() == vote.sequence()
        })
    }

    fn apply(&mut self, write: StagedWrite) {
        match write {
            StagedWrite::InsertSession(session) | StagedWrite::UpdateSession(session) => {
                self.sessions.insert(*session.id(), session);
            }
            StagedWrite::AddMembers(session_id, ids) => {
                self.members.entry(session_id).or_default().extend(ids);
            }
            StagedWrite::RemoveMembers(session_id, ids) => {
                if let Some(members) = self.members.get_mut(&session_id) {
                    for id in &ids {
                        members.remove(id);
                    }
                }
            }
            StagedWrite::InsertVote(vote) => self.votes.push(vote),
        }
    }
}

#[derive(Debug, Clone)]
enum StagedWrite {
    InsertSession(VoteSession),
    UpdateSession(VoteSession),
    AddMembers(VoteSessionId, Vec<RestaurantId>),
    RemoveMembers(VoteSessionId, Vec<RestaurantId>),
    InsertVote(VoteRecord),
}

fn concurrent_modification(session_id: &VoteSessionId) -> DomainError {
    DomainError::new(
        ErrorCode::ConstraintViolation,
        format!("Vote session {} was modified concurrently", session_id),
    )
}

fn constraint_violation(vote: &VoteRecord) -> DomainError {
    DomainError::new(
        ErrorCode::ConstraintViolation,
        format!(
            "Vote #{} by user {} in session {} already exists",
            vote.sequence(),
            vote.user_id(),
            vote.session_id()
        ),
    )
}

/// In-memory voting store.
#[derive(Debug, Clone)]
pub struct InMemoryVotingStore {
    committed: Arc<RwLock<VotingTables>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryVotingStore {
    pub fn new() -> Self {
        Self {
            committed: Arc::new(RwLock::new(VotingTables::default())),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent write fail with a database error (for tests).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Committed state of a session.
    pub async fn session(&self, id: &VoteSessionId) -> Option<VoteSession> {
        self.committed.read().await.sessions.get(id).cloned()
    }

    /// Committed votes of a session.
    pub async fn votes(&self, session_id: &VoteSessionId) -> Vec<VoteRecord> {
        self.committed
            .read()
            .await
            .votes
            .iter()
            .filter(|v| v.session_id() == session_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryVotingStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Unhealthy while writes are set to fail.
#[async_trait]
impl HealthCheck for InMemoryVotingStore {
    async fn ping_database(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated storage outage",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VotingStore for InMemoryVotingStore {
    async fn begin(&self) -> Result<Box<dyn VotingUnitOfWork>, DomainError> {
        let snapshot = self.committed.read().await.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            committed: Arc::clone(&self.committed),
            base: snapshot.sessions.clone(),
            view: snapshot,
            guarded: HashMap::new(),
            staged: Vec::new(),
            fail_writes: Arc::clone(&self.fail_writes),
        }))
    }
}

/// Unit of work over a snapshot of the committed tables.
pub struct InMemoryUnitOfWork {
    committed: Arc<RwLock<VotingTables>>,
    /// Sessions as of `begin`, untouched by staged writes.
    base: HashMap<VoteSessionId, VoteSession>,
    view: VotingTables,
    /// Locked or written sessions and the row each expects at commit.
    guarded: HashMap<VoteSessionId, Option<VoteSession>>,
    staged: Vec<StagedWrite>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryUnitOfWork {
    fn guard(&mut self, id: &VoteSessionId) {
        if !self.guarded.contains_key(id) {
            let expected = self.base.get(id).cloned();
            self.guarded.insert(*id, expected);
        }
    }

    fn stage(&mut self, write: StagedWrite) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated write failure",
            ));
        }
        self.view.apply(write.clone());
        self.staged.push(write);
        Ok(())
    }
}

#[async_trait]
impl VoteSessionRepository for InMemoryUnitOfWork {
    async fn insert_session(&mut self, session: &VoteSession) -> Result<(), DomainError> {
        if self.view.sessions.contains_key(session.id()) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Vote session {} already exists", session.id()),
            ));
        }
        self.guard(session.id());
        self.stage(StagedWrite::InsertSession(session.clone()))
    }

    async fn update_session(&mut self, session: &VoteSession) -> Result<(), DomainError> {
        if !self.view.sessions.contains_key(session.id()) {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Vote session not found: {}", session.id()),
            ));
        }
        self.guard(session.id());
        self.stage(StagedWrite::UpdateSession(session.clone()))
    }

    async fn load_session(
        &mut self,
        id: &VoteSessionId,
        lock: RowLock,
    ) -> Result<Option<VoteSession>, DomainError> {
        if !matches!(lock, RowLock::None) {
            self.guard(id);
        }
        Ok(self.view.sessions.get(id).cloned())
    }

    async fn expired_active_sessions(
        &mut self,
        now: &Timestamp,
    ) -> Result<Vec<VoteSession>, DomainError> {
        let mut expired: Vec<VoteSession> = self
            .view
            .sessions
            .values()
            .filter(|s| s.is_expired(now))
            .cloned()
            .collect();
        expired.sort_by_key(|s| s.auto_close_at().copied());
        Ok(expired)
    }

    async fn list_sessions(
        &mut self,
        filter: &SessionListFilter,
    ) -> Result<Page<VoteSession>, DomainError> {
        let mut matching: Vec<&VoteSession> = self
            .view
            .sessions
            .values()
            .filter(|s| filter.status.map_or(true, |status| s.status() == status))
            .filter(|s| filter.creator_id.map_or(true, |c| s.creator_id() == &c))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(a.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(filter.page.offset as usize)
            .take(filter.page.limit as usize)
            .cloned()
            .collect();
        Ok(Page {
            items,
            total,
            offset: filter.page.offset,
            limit: filter.page.limit,
        })
    }
}

#[async_trait]
impl MembershipRepository for InMemoryUnitOfWork {
    async fn member_ids(
        &mut self,
        session_id: &VoteSessionId,
    ) -> Result<Vec<RestaurantId>, DomainError> {
        Ok(self
            .view
            .members
            .get(session_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn is_member(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_id: &RestaurantId,
    ) -> Result<bool, DomainError> {
        Ok(self
            .view
            .members
            .get(session_id)
            .map_or(false, |m| m.contains(restaurant_id)))
    }

    async fn add_members(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_ids: &[RestaurantId],
    ) -> Result<(), DomainError> {
        self.stage(StagedWrite::AddMembers(*session_id, restaurant_ids.to_vec()))
    }

    async fn remove_members(
        &mut self,
        session_id: &VoteSessionId,
        restaurant_ids: &[RestaurantId],
    ) -> Result<(), DomainError> {
        self.stage(StagedWrite::RemoveMembers(
            *session_id,
            restaurant_ids.to_vec(),
        ))
    }
}

#[async_trait]
impl VoteRepository for InMemoryUnitOfWork {
    async fn count_votes_by_user(
        &mut self,
        session_id: &VoteSessionId,
        user_id: &UserId,
    ) -> Result<u32, DomainError> {
        Ok(self
            .view
            .votes
            .iter()
            .filter(|v| v.session_id() == session_id && v.user_id() == user_id)
            .count() as u32)
    }

    async fn insert_vote(&mut self, vote: &VoteRecord) -> Result<(), DomainError> {
        if self.view.slot_taken(vote) {
            return Err(constraint_violation(vote));
        }
        self.stage(StagedWrite::InsertVote(vote.clone()))
    }

    async fn votes_for_session(
        &mut self,
        session_id: &VoteSessionId,
    ) -> Result<Vec<VoteRecord>, DomainError> {
        Ok(self
            .view
            .votes
            .iter()
            .filter(|v| v.session_id() == session_id)
            .cloned()
            .collect())
    }

    async fn votes_by_user(
        &mut self,
        session_id: &VoteSessionId,
        user_id: &UserId,
    ) -> Result<Vec<VoteRecord>, DomainError> {
        let mut votes: Vec<VoteRecord> = self
            .view
            .votes
            .iter()
            .filter(|v| v.session_id() == session_id && v.user_id() == user_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.sequence());
        Ok(votes)
    }

    async fn list_votes(
        &mut self,
        session_id: &VoteSessionId,
        page: &PageRequest,
    ) -> Result<Page<VoteRecord>, DomainError> {
        let votes = self.votes_for_session(session_id).await?;
        let total = votes.len() as u64;
        let items = votes
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            offset: page.offset,
            limit: page.limit,
        })
    }
}

#[async_trait]
impl VotingUnitOfWork for InMemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        if this.staged.is_empty() {
            return Ok(());
        }
        let mut committed = this.committed.write().await;

        for (id, expected) in &this.guarded {
            if committed.sessions.get(id) != expected.as_ref() {
                return Err(concurrent_modification(id));
            }
        }
        for write in &this.staged {
            if let StagedWrite::InsertVote(vote) = write {
                if committed.slot_taken(vote) {
                    return Err(constraint_violation(vote));
                }
            }
        }
        for write in this.staged {
            committed.apply(write);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}
