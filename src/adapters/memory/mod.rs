//! In-memory adapters for tests and local development.

mod restaurant_registry;
mod voting_store;

pub use restaurant_registry::InMemoryRestaurantRegistry;
pub use voting_store::{InMemoryUnitOfWork, InMemoryVotingStore};
