//! EndSessionHandler - Command handler for closing a session and picking the winner.

use std::sync::Arc;

use crate::application::voting::{EndSessionOutcome, SessionLifecycle};
use crate::domain::foundation::{CommandMetadata, VoteSessionId};
use crate::domain::voting::VotingError;
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub session_id: VoteSessionId,
}

pub struct EndSessionHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl EndSessionHandler {
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
        cmd: EndSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<EndSessionOutcome, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .end(uow.as_mut(), &cmd.session_id, &metadata.user_id, now)
            .await;
        let outcome = complete(uow, outcome).await?;

        match outcome.winner() {
            Some(winner) => tracing::info!(
                session_id = %cmd.session_id,
                "Vote session ended, winner restaurant {}",
                winner
            ),
            None => tracing::info!(session_id = %cmd.session_id, "Vote session ended without votes"),
        }
        Ok(outcome)
    }
}
