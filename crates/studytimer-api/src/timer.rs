//! Timer session state as seen by the presentation layer, and the
//! locally persisted snapshot.

use serde::{Deserialize, Serialize};
use studytimer_util::{GoalId, format_countdown};

/// Lifecycle of one timer session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No goal bound yet, or the goal fetch failed
    Uninitialized,
    /// Goal fetch in flight
    Loading,
    /// Initialized from the goal's target duration
    Fresh,
    /// Initialized from a persisted snapshot, never running
    Restored,
    Running,
    Paused,
    /// Countdown exhausted; terminal for this session
    Complete,
}

impl SessionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// True once the session has a countdown to show
    pub fn has_countdown(&self) -> bool {
        !matches!(self, Self::Uninitialized | Self::Loading)
    }
}

/// The eight fill colours offered by the front end, with display names.
///
/// Any string is accepted as a flavor; this is only the offered palette.
pub const FLAVOR_PALETTE: [(&str, &str); 8] = [
    ("#60A5FA", "blue"),
    ("#EF4444", "red"),
    ("#FACC15", "yellow"),
    ("#F97316", "orange"),
    ("#EC4899", "pink"),
    ("#A855F7", "purple"),
    ("#22C55E", "green"),
    ("#F43F5E", "rose"),
];

/// Resolve a palette entry by 1-based index, colour name or hex value.
/// Anything else is passed through unchanged.
pub fn resolve_flavor(input: &str) -> String {
    let input = input.trim();
    if let Some((hex, _)) = input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| FLAVOR_PALETTE.get(i))
    {
        return hex.to_string();
    }
    FLAVOR_PALETTE
        .iter()
        .find(|(hex, name)| hex.eq_ignore_ascii_case(input) || name.eq_ignore_ascii_case(input))
        .map(|(hex, _)| hex.to_string())
        .unwrap_or_else(|| input.to_string())
}

/// Read-only view of a timer session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub goal_id: Option<GoalId>,
    pub goal_name: Option<String>,
    pub status: SessionStatus,
    pub total_seconds: u64,
    pub seconds_remaining: u64,
    pub running: bool,
    pub selected_flavor: Option<String>,
    /// Remaining share of the target, 0-100
    pub fill_percent: f64,
    /// Countdown text, `HH:MM:SS` or `MM:SS`
    pub display: String,
    /// User asked to leave and has not confirmed yet
    pub stop_prompt: bool,
    /// Completion has not been acknowledged yet
    pub completion_notice: bool,
}

impl SessionView {
    /// View of an engine with no session
    pub fn idle(goal_id: Option<GoalId>, status: SessionStatus) -> Self {
        Self {
            goal_id,
            goal_name: None,
            status,
            total_seconds: 0,
            seconds_remaining: 0,
            running: false,
            selected_flavor: None,
            fill_percent: 0.0,
            display: format_countdown(0),
            stop_prompt: false,
            completion_notice: false,
        }
    }
}

/// Remaining share of the target as a percentage; zero when `total` is zero
pub fn fill_percent(remaining: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (remaining.min(total) as f64 / total as f64) * 100.0
    }
}

/// Persisted progress for one goal, stored under [`snapshot_key`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub seconds_left: i64,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub selected_juice: Option<String>,
}

impl TimerSnapshot {
    /// Decode a stored value. Returns `None` unless it parses and has time left.
    pub fn restorable(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|s| s.seconds_left > 0)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Local storage key for a goal's snapshot
pub fn snapshot_key(goal_id: &GoalId) -> String {
    format!("timer-{}", goal_id)
}
