//! HTTP middleware for axum.
//!
//! - `identity` - caller id extractor fed by the authentication gateway

pub mod identity;

pub use identity::{IdentityRejection, RequireUser, USER_ID_HEADER};
