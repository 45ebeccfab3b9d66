//! Add/RemoveRestaurantsHandler - Command handlers for candidate restaurants.

use std::sync::Arc;

use crate::application::voting::SessionLifecycle;
use crate::domain::foundation::{CommandMetadata, RestaurantId, VoteSessionId};
use crate::domain::voting::VotingError;
use crate::ports::{Clock, VotingStore};

use super::{begin, complete};

/// Command to add candidate restaurants to a Draft session.
#[derive(Debug, Clone)]
pub struct AddRestaurantsCommand {
    pub session_id: VoteSessionId,
    pub restaurant_ids: Vec<RestaurantId>,
}

/// Command to remove candidate restaurants from a Draft session.
#[derive(Debug, Clone)]
pub struct RemoveRestaurantsCommand {
    pub session_id: VoteSessionId,
    pub restaurant_ids: Vec<RestaurantId>,
}

pub struct AddRestaurantsHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl AddRestaurantsHandler {
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

    /// Returns the resulting candidate ids.
    pub async fn handle(
        &self,
        cmd: AddRestaurantsCommand,
        metadata: CommandMetadata,
    ) -> Result<Vec<RestaurantId>, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .add_restaurants(
                uow.as_mut(),
                &cmd.session_id,
                &metadata.user_id,
                &cmd.restaurant_ids,
                now,
            )
            .await;
        let members = complete(uow, outcome).await?;

        tracing::info!(
            session_id = %cmd.session_id,
            "Candidate restaurants added, {} now in session",
            members.len()
        );
        Ok(members)
    }
}

pub struct RemoveRestaurantsHandler {
    store: Arc<dyn VotingStore>,
    lifecycle: Arc<SessionLifecycle>,
    clock: Arc<dyn Clock>,
}

impl RemoveRestaurantsHandler {
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

    /// Returns the resulting candidate ids.
    pub async fn handle(
        &self,
        cmd: RemoveRestaurantsCommand,
        metadata: CommandMetadata,
    ) -> Result<Vec<RestaurantId>, VotingError> {
        let now = self.clock.now();
        let mut uow = begin(self.store.as_ref()).await?;
        let outcome = self
            .lifecycle
            .remove_restaurants(
                uow.as_mut(),
                &cmd.session_id,
                &metadata.user_id,
                &cmd.restaurant_ids,
                now,
            )
            .await;
        let members = complete(uow, outcome).await?;

        tracing::info!(
            session_id = %cmd.session_id,
            "Candidate restaurants removed, {} left in session",
            members.len()
        );
        Ok(members)
    }
}
