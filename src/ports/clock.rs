//! Clock port.
//!
//! Auto-close is evaluated against an explicit `now`; handlers read it from
//! here so tests can move time forward.

use crate::domain::foundation::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
