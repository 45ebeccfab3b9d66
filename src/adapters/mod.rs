//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - in-memory voting store and restaurant catalog (tests, local runs)
//! - `postgres` - PostgreSQL-backed voting store and restaurant catalog
//! - `http` - axum REST API
//! - `clock` - system and manual clocks

pub mod clock;
pub mod http;
pub mod memory;
pub mod postgres;

pub use clock::{ManualClock, SystemClock};
pub use memory::{InMemoryRestaurantRegistry, InMemoryVotingStore};
pub use postgres::{PostgresRestaurantRegistry, PostgresVotingStore};
