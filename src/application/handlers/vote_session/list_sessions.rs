//! ListSessionsHandler - Query handler for paging through sessions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::voting::SessionLifecycle;
use crate::domain::foundation::{UserId, VoteSessionStatus};
use crate::domain::voting::{VoteSession, VotingError};
use crate::ports::{Clock, Page, VotingStore};

use super::{begin, complete};

/// Which sessions to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    #[default]
    All,
    /// Sessions currently accepting votes.
    Active,
    /// Sessions created by the caller.
    Mine,
}

#[derive(Debug, Clone)]
pub struct ListSessionsQuery {
    pub user_id: UserId,
    pub scope: SessionScope,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

pub struct ListSessionsHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl ListSessionsHandler {
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

    pub async fn handle(&self, query: ListSessionsQuery) -> Result<Page<VoteSession>, VotingError> {
        let now = self.clock.now();
        let page = self.lifecycle.rules().page(query.offset, query.limit);
        let (status, creator_id) = match query.scope {
            SessionScope::All => (None, None),
            SessionScope::Active => (Some(VoteSessionStatus::Active), None),
            SessionScope::Mine => (None, Some(query.user_id)),
        };

        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .list_sessions(uow.as_mut(), status, creator_id, page, now)
            .await;
        complete(uow, outcome).await
    }
}
