//! Restaurant registry port.
//!
//! Read-only access to the restaurant catalog. The catalog owns its own
//! soft-delete lifecycle; inactive restaurants are still returned.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, RestaurantId};
use crate::domain::voting::RestaurantRef;

#[async_trait]
pub trait RestaurantRegistry: Send + Sync {
    /// Whether the catalog knows this restaurant (active or not).
    async fn exists(&self, id: &RestaurantId) -> Result<bool, DomainError>;

    /// Look up a restaurant. Returns `None` if unknown.
    async fn get(&self, id: &RestaurantId) -> Result<Option<RestaurantRef>, DomainError>;

    /// Batch lookup. Unknown ids are absent from the map.
    async fn get_many(
        &self,
        ids: &[RestaurantId],
    ) -> Result<HashMap<RestaurantId, RestaurantRef>, DomainError> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(restaurant) = self.get(id).await? {
                found.insert(*id, restaurant);
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restaurant_registry_is_object_safe() {
        fn _accepts_dyn(_registry: &dyn RestaurantRegistry) {}
    }
}
