//! Wire types for studytimer
//!
//! This crate defines the stable shapes exchanged between the desktop
//! client and the service, and the locally persisted timer snapshot:
//! - Goal and account DTOs (REST bodies)
//! - Timer session status and views
//! - The `timer-<goalId>` snapshot layout

mod timer;
mod types;

pub use timer::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
