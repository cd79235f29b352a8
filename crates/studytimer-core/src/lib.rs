//! Timer session engine for studytimer
//!
//! This crate contains:
//! - The per-goal countdown state machine
//!   (Uninitialized -> Loading -> Fresh|Restored -> Running <-> Paused -> Complete)
//! - Snapshot write-back and restore, gated until the first restore attempt
//! - The goal-fetch capability the engine consumes
//!
//! The engine does not own a clock. Callers invoke [`TimerEngine::tick`] once
//! per elapsed second while the session is running.

mod engine;
mod events;
mod goals;
pub mod mock;
mod session;

pub use engine::*;
pub use events::*;
pub use goals::*;
pub use session::*;

use thiserror::Error;

/// Rejected user intents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("No timer session is active")]
    NoSession,

    /// Shown to the user; the session is left unchanged
    #[error("Please select a flavor first")]
    FlavorRequired,

    #[error("Timer already complete")]
    AlreadyComplete,
}
