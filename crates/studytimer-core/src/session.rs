//! Session state machine

use studytimer_api::{SessionStatus, SessionView, TimerSnapshot, fill_percent};
use studytimer_util::{GoalId, format_countdown};

use crate::TimerError;

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing happened
    Idle,
    Decremented { seconds_remaining: u64 },
    Completed,
}

/// Countdown state for one goal.
///
/// Running is not a separate flag: it is `status == Running`, so a
/// complete session can never be running.
#[derive(Debug, Clone)]
pub struct TimerSession {
    goal_id: GoalId,
    goal_name: String,
    total_seconds: u64,
    seconds_remaining: u64,
    status: SessionStatus,
    selected_flavor: Option<String>,
    stop_prompt: bool,
    completion_notice: bool,
}

impl TimerSession {
    /// A new countdown starting from the goal's full duration
    pub fn fresh(goal_id: GoalId, goal_name: impl Into<String>, total_seconds: u64) -> Self {
        Self {
            goal_id,
            goal_name: goal_name.into(),
            total_seconds,
            seconds_remaining: total_seconds,
            status: SessionStatus::Fresh,
            selected_flavor: None,
            stop_prompt: false,
            completion_notice: false,
        }
    }

    /// Resume from a stored snapshot. Never resumes running.
    pub fn restore(
        goal_id: GoalId,
        goal_name: impl Into<String>,
        total_seconds: u64,
        snapshot: &TimerSnapshot,
    ) -> Self {
        // A goal shortened since the snapshot was taken caps the remainder
        let seconds_remaining = (snapshot.seconds_left.max(0) as u64).min(total_seconds);

        Self {
            goal_id,
            goal_name: goal_name.into(),
            total_seconds,
            seconds_remaining,
            status: SessionStatus::Restored,
            selected_flavor: snapshot.selected_juice.clone(),
            stop_prompt: false,
            completion_notice: false,
        }
    }

    pub fn goal_id(&self) -> &GoalId {
        &self.goal_id
    }

    pub fn goal_name(&self) -> &str {
        &self.goal_name
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    pub fn selected_flavor(&self) -> Option<&str> {
        self.selected_flavor.as_deref()
    }

    /// Always permitted; does not affect running
    pub fn select_flavor(&mut self, flavor: impl Into<String>) {
        self.selected_flavor = Some(flavor.into());
    }

    /// Start or pause. Returns the new running state.
    pub fn toggle_running(&mut self) -> Result<bool, TimerError> {
        if self.selected_flavor.is_none() {
            return Err(TimerError::FlavorRequired);
        }

        self.status = match self.status {
            SessionStatus::Running => SessionStatus::Paused,
            SessionStatus::Complete => return Err(TimerError::AlreadyComplete),
            _ => SessionStatus::Running,
        };

        Ok(self.is_running())
    }

    /// Advance by one second if running
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }

        if self.seconds_remaining <= 1 {
            self.seconds_remaining = 0;
            self.status = SessionStatus::Complete;
            self.stop_prompt = false;
            self.completion_notice = true;
            return TickOutcome::Completed;
        }

        self.seconds_remaining -= 1;
        TickOutcome::Decremented {
            seconds_remaining: self.seconds_remaining,
        }
    }

    /// Returns false if the prompt was already open or the session is complete
    pub fn request_stop(&mut self) -> bool {
        if self.stop_prompt || self.is_complete() {
            return false;
        }
        self.stop_prompt = true;
        true
    }

    pub fn cancel_stop(&mut self) -> bool {
        std::mem::replace(&mut self.stop_prompt, false)
    }

    pub fn acknowledge_completion(&mut self) -> bool {
        std::mem::replace(&mut self.completion_notice, false)
    }

    /// The persisted form of the current state
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            seconds_left: self.seconds_remaining as i64,
            is_running: self.is_running(),
            selected_juice: self.selected_flavor.clone(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            goal_id: Some(self.goal_id.clone()),
            goal_name: Some(self.goal_name.clone()),
            status: self.status,
            total_seconds: self.total_seconds,
            seconds_remaining: self.seconds_remaining,
            running: self.is_running(),
            selected_flavor: self.selected_flavor.clone(),
            fill_percent: fill_percent(self.seconds_remaining, self.total_seconds),
            display: format_countdown(self.seconds_remaining),
            stop_prompt: self.stop_prompt,
            completion_notice: self.completion_notice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(total: u64) -> TimerSession {
        TimerSession::fresh(GoalId::new("g1"), "Read", total)
    }

    #[test]
    fn test_fresh_session() {
        let s = session(120);
        assert_eq!(s.status(), SessionStatus::Fresh);
        assert_eq!(s.seconds_remaining(), 120);
        assert!(!s.is_running());
        assert!(s.selected_flavor().is_none());
    }

    #[test]
    fn test_toggle_requires_flavor() {
        let mut s = session(120);
        assert_eq!(s.toggle_running(), Err(TimerError::FlavorRequired));
        assert_eq!(s.status(), SessionStatus::Fresh);
        assert_eq!(s.seconds_remaining(), 120);

        s.select_flavor("#22C55E");
        assert_eq!(s.toggle_running(), Ok(true));
        assert_eq!(s.status(), SessionStatus::Running);
        assert_eq!(s.toggle_running(), Ok(false));
        assert_eq!(s.status(), SessionStatus::Paused);
    }

    #[test]
    fn test_select_flavor_keeps_running_state() {
        let mut s = session(10);
        s.select_flavor("#EF4444");
        s.toggle_running().unwrap();
        s.select_flavor("#FACC15");
        assert!(s.is_running());
        assert_eq!(s.selected_flavor(), Some("#FACC15"));
    }

    #[test]
    fn test_tick_only_while_running() {
        let mut s = session(10);
        assert_eq!(s.tick(), TickOutcome::Idle);
        assert_eq!(s.seconds_remaining(), 10);

        s.select_flavor("#60A5FA");
        s.toggle_running().unwrap();
        assert_eq!(s.tick(), TickOutcome::Decremented { seconds_remaining: 9 });

        s.toggle_running().unwrap();
        assert_eq!(s.tick(), TickOutcome::Idle);
        assert_eq!(s.seconds_remaining(), 9);
    }

    #[test]
    fn test_ticks_run_to_completion() {
        let total = 90;
        let mut s = session(total);
        s.select_flavor("#60A5FA");
        s.toggle_running().unwrap();

        for _ in 0..total - 1 {
            assert!(matches!(s.tick(), TickOutcome::Decremented { .. }));
        }
        assert_eq!(s.tick(), TickOutcome::Completed);
        assert_eq!(s.seconds_remaining(), 0);
        assert!(!s.is_running());
        assert!(s.is_complete());
        assert!(s.view().completion_notice);

        assert_eq!(s.tick(), TickOutcome::Idle);
        assert_eq!(s.toggle_running(), Err(TimerError::AlreadyComplete));
    }

    #[test]
    fn test_zero_length_goal_completes_on_first_tick() {
        let mut s = session(0);
        s.select_flavor("#60A5FA");
        s.toggle_running().unwrap();
        assert_eq!(s.tick(), TickOutcome::Completed);
    }

    #[test]
    fn test_restore_never_running() {
        let snapshot = TimerSnapshot {
            seconds_left: 45,
            is_running: true,
            selected_juice: Some("#60A5FA".into()),
        };
        let s = TimerSession::restore(GoalId::new("g1"), "Read", 120, &snapshot);
        assert_eq!(s.status(), SessionStatus::Restored);
        assert_eq!(s.seconds_remaining(), 45);
        assert!(!s.is_running());
        assert_eq!(s.selected_flavor(), Some("#60A5FA"));
    }

    #[test]
    fn test_restore_caps_at_total() {
        let snapshot = TimerSnapshot {
            seconds_left: 500,
            is_running: false,
            selected_juice: None,
        };
        let s = TimerSession::restore(GoalId::new("g1"), "Read", 120, &snapshot);
        assert_eq!(s.seconds_remaining(), 120);
    }

    #[test]
    fn test_restore_with_zero_total() {
        let snapshot = TimerSnapshot {
            seconds_left: 30,
            is_running: true,
            selected_juice: Some("#22C55E".into()),
        };
        let mut s = TimerSession::restore(GoalId::new("g1"), "Read", 0, &snapshot);
        assert_eq!(s.seconds_remaining(), 0);
        assert_eq!(s.status(), SessionStatus::Restored);

        s.toggle_running().unwrap();
        assert_eq!(s.tick(), TickOutcome::Completed);
        assert!(s.is_complete());
        assert_eq!(s.seconds_remaining(), 0);
    }

    #[test]
    fn test_modal_flags() {
        let mut s = session(10);
        assert!(s.request_stop());
        assert!(!s.request_stop());
        assert!(s.view().stop_prompt);
        assert!(s.cancel_stop());
        assert!(!s.cancel_stop());
        assert!(!s.acknowledge_completion());
    }

    #[test]
    fn test_view() {
        let mut s = session(3600);
        s.select_flavor("#A855F7");
        s.toggle_running().unwrap();
        for _ in 0..1800 {
            s.tick();
        }
        let view = s.view();
        assert_eq!(view.display, "30:00");
        assert_eq!(view.fill_percent, 50.0);
        assert!(view.running);
        assert_eq!(s.snapshot().seconds_left, 1800);
        assert!(s.snapshot().is_running);
    }
}
