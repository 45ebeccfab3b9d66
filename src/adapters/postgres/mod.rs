//! PostgreSQL adapters - Database implementations for the voting ports.
//!
//! - `PostgresVotingStore` - transactional session, membership and vote storage
//! - `PostgresRestaurantRegistry` - read-only view of the restaurant catalog
//! - `PostgresHealthCheck` - `SELECT 1` for readiness

mod health_check;
mod restaurant_registry;
mod voting_store;

pub use health_check::PostgresHealthCheck;
pub use restaurant_registry::PostgresRestaurantRegistry;
pub use voting_store::{PostgresUnitOfWork, PostgresVotingStore};
