//! Shared utilities for studytimer
//!
//! This crate provides:
//! - ID types (GoalId, UserId)
//! - The error taxonomy shared by the client and the service
//! - Goal duration parsing (`HH:MM`) and countdown formatting
//! - Keyed rate limiting
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod rate_limit;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
