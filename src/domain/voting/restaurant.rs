//! Read-only view of a catalog restaurant.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::RestaurantId;

/// Restaurant as seen from the voting domain.
///
/// Soft-deleted catalog entries are still returned, with `is_active` false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantRef {
    pub id: RestaurantId,
    pub name: String,
    pub is_active: bool,
}

impl RestaurantRef {
    pub fn new(id: RestaurantId, name: impl Into<String>, is_active: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_active,
        }
    }
}
