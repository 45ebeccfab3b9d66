//! Query handlers for recorded votes.

use std::sync::Arc;

use crate::application::voting::{UserVotes, VoteLedger, VotingRules};
use crate::domain::foundation::{UserId, VoteSessionId};
use crate::domain::voting::{VoteRecord, VotingError};
use crate::ports::{Clock, Page, VotingStore};

use super::{begin, complete};

/// The caller's own votes in a session.
#[derive(Debug, Clone)]
pub struct ListMyVotesQuery {
    pub session_id: VoteSessionId,
    pub user_id: UserId,
}

/// Every vote of a session, in casting order.
#[derive(Debug, Clone)]
pub struct ListSessionVotesQuery {
    pub session_id: VoteSessionId,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

pub struct ListMyVotesHandler {
    store: Arc<dyn VotingStore>,
    ledger: Arc<VoteLedger>,
    clock: Arc<dyn Clock>,
}

impl ListMyVotesHandler {
    pub fn new(store: Arc<dyn VotingStore>, ledger: Arc<VoteLedger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            ledger,
            clock,
        }
    }

    pub async fn handle(&self, query: ListMyVotesQuery) -> Result<UserVotes, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .ledger
            .votes_by_user(uow.as_mut(), &query.session_id, &query.user_id, now)
            .await;
        complete(uow, outcome).await
    }
}

pub struct ListSessionVotesHandler {
    store: Arc<dyn VotingStore>,
    ledger: Arc<VoteLedger>,
    rules: VotingRules,
    clock: Arc<dyn Clock>,
}

impl ListSessionVotesHandler {
    pub fn new(
        store: Arc<dyn VotingStore>,
        ledger: Arc<VoteLedger>,
        rules: VotingRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ledger,
            rules,
            clock,
        }
    }

    pub async fn handle(
        &self,
        query: ListSessionVotesQuery,
    ) -> Result<Page<VoteRecord>, VotingError> {
        let now = self.clock.now();
        let page = self.rules.page(query.offset, query.limit);
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .ledger
            .session_votes(uow.as_mut(), &query.session_id, page, now)
            .await;
        complete(uow, outcome).await
    }
}
