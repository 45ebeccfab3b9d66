//! Lunch Vote - time-boxed restaurant voting sessions
//!
//! A session creator picks candidate restaurants and opens the session;
//! participants spend a small budget of votes whose weight decays with each
//! additional vote, and the highest weighted total wins.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
