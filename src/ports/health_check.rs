//! Health check port.
//!
//! Readiness depends on storage being reachable; the check is a cheap round
//! trip, not a query over voting data.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Round trip to the backing database.
    async fn ping_database(&self) -> Result<(), DomainError>;
}
