//! Core events emitted by the engine

use studytimer_api::SessionStatus;
use studytimer_util::GoalId;

/// Events emitted by the timer engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Goal fetched and session initialized
    SessionLoaded {
        goal_id: GoalId,
        status: SessionStatus,
        seconds_remaining: u64,
    },

    /// Goal fetch failed; no countdown
    LoadFailed { goal_id: GoalId, message: String },

    FlavorSelected { flavor: String },

    /// Countdown started or paused
    RunningChanged { running: bool },

    /// One second elapsed
    Ticked { seconds_remaining: u64 },

    /// Countdown reached zero
    Completed { goal_id: GoalId },

    /// Stop confirmation opened or dismissed
    StopPromptChanged { open: bool },

    /// User left mid-countdown; progress retained
    Abandoned { goal_id: GoalId, seconds_remaining: u64 },

    /// User left and dropped the stored progress
    ProgressDiscarded { goal_id: GoalId },
}
