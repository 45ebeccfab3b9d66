//! GetSessionHandler - Query handler for a session and its candidates.

use std::sync::Arc;

use crate::application::voting::{SessionDetails, SessionLifecycle};
use crate::domain::foundation::VoteSessionId;
use crate::domain::voting::VotingError;
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: VoteSessionId,
}

pub struct GetSessionHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl GetSessionHandler {
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

    pub async fn handle(&self, query: GetSessionQuery) -> Result<SessionDetails, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .get_session(uow.as_mut(), &query.session_id, now)
            .await;
        complete(uow, outcome).await
    }
}
