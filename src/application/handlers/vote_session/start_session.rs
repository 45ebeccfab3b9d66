//! StartSessionHandler - Command handler for opening a session for votes.

use std::sync::Arc;

use crate::application::voting::SessionLifecycle;
use crate::domain::foundation::{CommandMetadata, VoteSessionId};
use crate::domain::voting::{VoteSession, VotingError};
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    pub session_id: VoteSessionId,
}

pub struct StartSessionHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl StartSessionHandler {
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
        cmd: StartSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<VoteSession, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .start(uow.as_mut(), &cmd.session_id, &metadata.user_id, now)
            .await;
        let session = complete(uow, outcome).await?;

        tracing::info!(session_id = %cmd.session_id, "Vote session started");
        Ok(session)
    }
}
