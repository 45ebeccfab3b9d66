//! CreateSessionHandler - Command handler for creating vote sessions.

use std::sync::Arc;

use crate::application::voting::{NewSession, SessionLifecycle};
use crate::domain::foundation::{CommandMetadata, Timestamp};
use crate::domain::voting::{VoteSession, VotingError};
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

/// Command to create a new vote session. The caller becomes its creator.
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub title: String,
    pub description: Option<String>,
    pub votes_per_user: Option<u32>,
    pub auto_close_at: Option<Timestamp>,
}

/// Handler for creating vote sessions.
pub struct CreateSessionHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl CreateSessionHandler {
    pub fn new(
        store: Arc<dyn VotingStore>,
        lifecycle: Arc<SessionLifecycle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<VoteSession, VotingError> {
        let now = self.clock.now();
        let input = NewSession {
            title: cmd.title,
            description: cmd.description,
            votes_per_user: cmd.votes_per_user,
            auto_close_at: cmd.auto_close_at,
        };

        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .create(uow.as_mut(), metadata.user_id, input, now)
            .await;
        let session = complete(uow, outcome).await?;

        tracing::info!(
            session_id = %session.id(),
            creator_id = %metadata.user_id,
            correlation_id = %metadata.correlation_id(),
            source = metadata.source().unwrap_or("unknown"),
            "Vote session created"
        );
        Ok(session)
    }
}
