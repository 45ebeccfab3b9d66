//! SweepExpiredHandler - closes every Active session past its deadline.
//!
//! Backs the maintenance endpoint; reads already sweep lazily, so running
//! this is never required for correctness.

use std::sync::Arc;

use crate::application::voting::SessionLifecycle;
use crate::domain::foundation::VoteSessionId;
use crate::domain::voting::VotingError;
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

pub struct SweepExpiredHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl SweepExpiredHandler {
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

    /// Returns the ids of the sessions closed by this run.
    pub async fn handle(&self) -> Result<Vec<VoteSessionId>, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self.lifecycle.check_auto_close(uow.as_mut(), now).await;
        let closed = complete(uow, outcome).await?;
        if !closed.is_empty() {
            tracing::info!(count = closed.len(), "Expired vote sessions closed");
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::vote_session::test_support::Fixture;
    use crate::domain::foundation::VoteSessionStatus;

    #[tokio::test]
    async fn closes_only_expired_sessions() {
        let fx = Fixture::new();
        let expiring = fx.active(Some(10)).await;
        let lasting = fx.active(Some(1000)).await;
        fx.clock.advance_secs(20);
        let handler = SweepExpiredHandler::new(fx.store.clone(), fx.lifecycle.clone(), fx.clock.clone());

        let closed = handler.handle().await.unwrap();
        assert_eq!(closed, vec![expiring]);
        assert_eq!(
            fx.store.session(&lasting).await.unwrap().status(),
            VoteSessionStatus::Active
        );

        assert!(handler.handle().await.unwrap().is_empty());
    }
}
