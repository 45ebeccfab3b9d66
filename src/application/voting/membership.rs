//! Membership - candidate restaurants of a session.
//!
//! Only resolves and writes links; creator and Draft checks belong to the
//! lifecycle that calls it.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RestaurantId, VoteSessionId};
use crate::domain::voting::VotingError;
use crate::ports::{MembershipRepository, RestaurantRegistry, VotingUnitOfWork};

/// A candidate restaurant as shown alongside its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRestaurant {
    pub restaurant_id: RestaurantId,
    /// Absent if the catalog no longer knows the restaurant.
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

pub struct Membership {
    registry: Arc<dyn RestaurantRegistry>,
}

impl Membership {
    pub fn new(registry: Arc<dyn RestaurantRegistry>) -> Self {
        Self { registry }
    }

    /// Link restaurants to the session and return the resulting member ids.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `ids` is empty
    /// - `RestaurantNotFound` if any id is unknown or already inactive
    pub async fn add(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        ids: &[RestaurantId],
    ) -> Result<Vec<RestaurantId>, VotingError> {
        let ids = Self::distinct(ids)?;
        let found = self.registry.get_many(&ids).await?;
        let missing: Vec<RestaurantId> = ids
            .iter()
            .filter(|id| !found.get(id).map_or(false, |r| r.is_active))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(VotingError::RestaurantNotFound(missing));
        }

        uow.add_members(session_id, &ids).await?;
        Ok(uow.member_ids(session_id).await?)
    }

    /// Unlink restaurants and return the resulting member ids.
    ///
    /// Inactive restaurants may be removed; unlinked ones are ignored.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `ids` is empty
    /// - `RestaurantNotFound` if any id is unknown to the catalog
    pub async fn remove(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
        ids: &[RestaurantId],
    ) -> Result<Vec<RestaurantId>, VotingError> {
        let ids = Self::distinct(ids)?;
        let mut missing = Vec::new();
        for id in &ids {
            if !self.registry.exists(id).await? {
                missing.push(*id);
            }
        }
        if !missing.is_empty() {
            return Err(VotingError::RestaurantNotFound(missing));
        }

        uow.remove_members(session_id, &ids).await?;
        Ok(uow.member_ids(session_id).await?)
    }

    /// Current members resolved through the catalog.
    pub async fn describe(
        &self,
        uow: &mut dyn VotingUnitOfWork,
        session_id: &VoteSessionId,
    ) -> Result<Vec<MemberRestaurant>, VotingError> {
        let ids = uow.member_ids(session_id).await?;
        let found = self.registry.get_many(&ids).await?;
        Ok(ids
            .into_iter()
            .map(|id| {
                let restaurant = found.get(&id);
                MemberRestaurant {
                    restaurant_id: id,
                    name: restaurant.map(|r| r.name.clone()),
                    is_active: restaurant.map(|r| r.is_active),
                }
            })
            .collect())
    }

    fn distinct(ids: &[RestaurantId]) -> Result<Vec<RestaurantId>, VotingError> {
        if ids.is_empty() {
            return Err(VotingError::validation(
                "restaurant_ids",
                "At least one restaurant id is required",
            ));
        }
        Ok(ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVotingStore;
    use crate::application::voting::test_support::{begin, registry};

    fn ids(raw: &[i64]) -> Vec<RestaurantId> {
        raw.iter().map(|id| RestaurantId::new(*id)).collect()
    }

    #[tokio::test]
    async fn add_deduplicates_and_returns_sorted_members() {
        let store = InMemoryVotingStore::new();
        let membership = Membership::new(registry());
        let session_id = VoteSessionId::new();
        let mut uow = begin(&store).await;

        let members = membership
            .add(uow.as_mut(), &session_id, &ids(&[2, 1, 2]))
            .await
            .unwrap();
        assert_eq!(members, ids(&[1, 2]));

        let again = membership
            .add(uow.as_mut(), &session_id, &ids(&[1]))
            .await
            .unwrap();
        assert_eq!(again, ids(&[1, 2]));
    }

    #[tokio::test]
    async fn add_rejects_unknown_and_inactive_restaurants() {
        let store = InMemoryVotingStore::new();
        let registry = registry();
        registry.deactivate(RestaurantId::new(3)).await;
        let membership = Membership::new(registry);
        let session_id = VoteSessionId::new();
        let mut uow = begin(&store).await;

        let err = membership
            .add(uow.as_mut(), &session_id, &ids(&[1, 3, 42]))
            .await
            .unwrap_err();
        assert_eq!(err, VotingError::RestaurantNotFound(ids(&[3, 42])));
        assert!(uow.member_ids(&session_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_rejects_empty_list() {
        let store = InMemoryVotingStore::new();
        let membership = Membership::new(registry());
        let mut uow = begin(&store).await;

        let err = membership
            .add(uow.as_mut(), &VoteSessionId::new(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, VotingError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn remove_accepts_inactive_and_ignores_non_members() {
        let store = InMemoryVotingStore::new();
        let registry = registry();
        let membership = Membership::new(registry.clone());
        let session_id = VoteSessionId::new();
        let mut uow = begin(&store).await;
        membership
            .add(uow.as_mut(), &session_id, &ids(&[1, 2]))
            .await
            .unwrap();
        registry.deactivate(RestaurantId::new(2)).await;

        let members = membership
            .remove(uow.as_mut(), &session_id, &ids(&[2, 3]))
            .await
            .unwrap();
        assert_eq!(members, ids(&[1]));
    }

    #[tokio::test]
    async fn remove_rejects_unknown_restaurant() {
        let store = InMemoryVotingStore::new();
        let membership = Membership::new(registry());
        let mut uow = begin(&store).await;

        let err = membership
            .remove(uow.as_mut(), &VoteSessionId::new(), &ids(&[77]))
            .await
            .unwrap_err();
        assert_eq!(err, VotingError::RestaurantNotFound(ids(&[77])));
    }

    #[tokio::test]
    async fn describe_resolves_names_by_value() {
        let store = InMemoryVotingStore::new();
        let registry = registry();
        let membership = Membership::new(registry.clone());
        let session_id = VoteSessionId::new();
        let mut uow = begin(&store).await;
        membership
            .add(uow.as_mut(), &session_id, &ids(&[1, 2]))
            .await
            .unwrap();
        registry.purge(RestaurantId::new(2)).await;

        let members = membership.describe(uow.as_mut(), &session_id).await.unwrap();
        assert_eq!(members[0].name.as_deref(), Some("Pho House"));
        assert_eq!(members[1].restaurant_id, RestaurantId::new(2));
        assert!(members[1].name.is_none());
    }
}
