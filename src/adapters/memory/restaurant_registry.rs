//! In-memory restaurant catalog.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, RestaurantId};
use crate::domain::voting::RestaurantRef;
use crate::ports::RestaurantRegistry;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRestaurantRegistry {
    restaurants: Arc<RwLock<HashMap<RestaurantId, RestaurantRef>>>,
}

impl InMemoryRestaurantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with active restaurants.
    pub fn with_restaurants<'a>(entries: impl IntoIterator<Item = (i64, &'a str)>) -> Self {
        let restaurants = entries
            .into_iter()
            .map(|(id, name)| {
                let id = RestaurantId::new(id);
                (id, RestaurantRef::new(id, name, true))
            })
            .collect();
        Self {
            restaurants: Arc::new(RwLock::new(restaurants)),
        }
    }

    pub async fn insert(&self, restaurant: RestaurantRef) {
        self.restaurants
            .write()
            .await
            .insert(restaurant.id, restaurant);
    }

    /// Soft-delete a restaurant, as the catalog would.
    pub async fn deactivate(&self, id: RestaurantId) {
        if let Some(restaurant) = self.restaurants.write().await.get_mut(&id) {
            restaurant.is_active = false;
        }
    }

    /// Drop a restaurant entirely.
    pub async fn purge(&self, id: RestaurantId) {
        self.restaurants.write().await.remove(&id);
    }
}

#[async_trait]
impl RestaurantRegistry for InMemoryRestaurantRegistry {
    async fn exists(&self, id: &RestaurantId) -> Result<bool, DomainError> {
        Ok(self.restaurants.read().await.contains_key(id))
    }

    async fn get(&self, id: &RestaurantId) -> Result<Option<RestaurantRef>, DomainError> {
        Ok(self.restaurants.read().await.get(id).cloned())
    }

    async fn get_many(
        &self,
        ids: &[RestaurantId],
    ) -> Result<HashMap<RestaurantId, RestaurantRef>, DomainError> {
        let restaurants = self.restaurants.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| restaurants.get(id).map(|r| (*id, r.clone())))
            .collect())
    }
}
