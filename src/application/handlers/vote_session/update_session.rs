//! UpdateSessionHandler - Command handler for editing session details.

use std::sync::Arc;

use crate::application::voting::SessionLifecycle;
use crate::domain::foundation::{CommandMetadata, VoteSessionId};
use crate::domain::voting::{SessionDetailsUpdate, VoteSession, VotingError};
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

/// Command to edit title, description or deadline.
#[derive(Debug, Clone)]
pub struct UpdateSessionCommand {
    pub session_id: VoteSessionId,
    pub update: SessionDetailsUpdate,
}

pub struct UpdateSessionHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl UpdateSessionHandler {
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
        cmd: UpdateSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<VoteSession, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .update_details(uow.as_mut(), &cmd.session_id, &metadata.user_id, cmd.update, now)
            .await;
        let session = complete(uow, outcome).await?;

        tracing::info!(session_id = %cmd.session_id, "Vote session details updated");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::vote_session::test_support::Fixture;

    fn handler(fx: &Fixture) -> UpdateSessionHandler {
        UpdateSessionHandler::new(fx.store.clone(), fx.lifecycle.clone(), fx.clock.clone())
    }

    #[tokio::test]
    async fn creator_can_rename_and_set_deadline() {
        let fx = Fixture::new();
        let id = fx.draft(None).await;
        let deadline = fx.clock.now().plus_secs(2700);

        let session = handler(&fx)
            .handle(
                UpdateSessionCommand {
                    session_id: id,
                    update: SessionDetailsUpdate {
                        title: Some("Thursday lunch".to_string()),
                        auto_close_at: Some(Some(deadline)),
                        ..Default::default()
                    },
                },
                Fixture::metadata(1),
            )
            .await
            .unwrap();

        assert_eq!(session.title(), "Thursday lunch");
        let stored = fx.store.session(&id).await.unwrap();
        assert_eq!(stored.auto_close_at(), Some(&deadline));
    }

    #[tokio::test]
    async fn other_users_are_forbidden() {
        let fx = Fixture::new();
        let id = fx.draft(None).await;

        let result = handler(&fx)
            .handle(
                UpdateSessionCommand {
                    session_id: id,
                    update: SessionDetailsUpdate {
                        title: Some("Hijacked".to_string()),
                        ..Default::default()
                    },
                },
                Fixture::metadata(2),
            )
            .await;
        assert!(matches!(result, Err(VotingError::Forbidden(_))));
        assert_eq!(fx.store.session(&id).await.unwrap().title(), "Friday lunch");
    }
}
