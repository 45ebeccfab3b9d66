//! AutoCloseSweep - lazy expiry of Active sessions.
//!
//! There is no background timer. Every session-scoped operation calls
//! `close_if_expired` first, and listings call `close_all_expired`, so no
//! caller ever observes a session as Active past its deadline.

use crate::domain::foundation::{Timestamp, VoteSessionId};
use crate::domain::voting::{VoteSession, VotingError};
use crate::ports::{RowLock, VoteSessionRepository, VotingUnitOfWork};

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoCloseSweep;

impl AutoCloseSweep {
    pub fn new() -> Self {
        Self
    }

    /// Close the target session if it is past its deadline and return its
    /// current state.
    ///
    /// `ended_at` is stamped with `now`, the evaluation time.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `Infrastructure` if the close can't be persisted
    pub async fn close_if_expired(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        now: Timestamp,
    ) -> Result<VoteSession, VotingError> {
        let session = uow
            .load_session(session_id, RowLock::None)
            .await?
            .ok_or(VotingError::SessionNotFound(*session_id))?;
        if !session.is_expired(&now) {
            return Ok(session);
        }

        // Re-read under lock; a concurrent sweep or end may have won.
        let mut session = uow
            .load_session(session_id, RowLock::Update)
            .await?
            .ok_or(VotingError::SessionNotFound(*session_id))?;
        if session.close_if_expired(now) {
            uow.update_session(&session).await?;
            tracing::debug!(
                session_id = %session_id,
                "Auto-closed vote session past its deadline"
            );
        }
        Ok(session)
    }

    /// Close every Active session past its deadline.
    ///
    /// Returns the ids of the sessions closed by this call.
    pub async fn close_all_expired(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        now: Timestamp,
    ) -> Result<Vec<VoteSessionId>, VotingError> {
        let expired = uow.expired_active_sessions(&now).await?;
        let mut closed = Vec::with_capacity(expired.len());
        for mut session in expired {
            if session.close_if_expired(now) {
                uow.update_session(&session).await?;
                closed.push(*session.id());
            }
        }
        if !closed.is_empty() {
            tracing::debug!(count = closed.len(), "Auto-closed expired vote sessions");
        }
        Ok(closed)
    }
}
