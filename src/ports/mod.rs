//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `VotingStore` / `VotingUnitOfWork` - transactional session, membership
//!   and vote persistence
//! - `RestaurantRegistry` - read-only restaurant catalog
//! - `Clock` - current time
//! - `HealthCheck` - storage reachability for readiness

mod clock;
mod health_check;
mod restaurant_registry;
mod voting_store;

pub use clock::Clock;
pub use health_check::HealthCheck;
pub use restaurant_registry::RestaurantRegistry;
pub use voting_store::{
    MembershipRepository, Page, PageRequest, RowLock, SessionListFilter, VoteRepository,
    VoteSessionRepository, VotingStore, VotingUnitOfWork,
};
