//! Timer engine: one session bound to one goal, with snapshot persistence

use std::sync::Arc;
use studytimer_api::{SessionStatus, SessionView, TimerSnapshot, snapshot_key};
use studytimer_store::KeyValueStore;
use studytimer_util::{GoalId, StudyTimerError, parse_goal_time};
use tracing::{debug, info, warn};

use crate::{CoreEvent, GoalLoad, GoalRecord, GoalSource, TickOutcome, TimerError, TimerSession};

/// Owns the timer session for a single goal
pub struct TimerEngine {
    goal_id: Option<GoalId>,
    goals: Arc<dyn GoalSource>,
    state: Arc<dyn KeyValueStore>,
    status: SessionStatus,
    session: Option<TimerSession>,
    /// Set once the stored snapshot has been read; no write-back before that
    restored: bool,
}

impl TimerEngine {
    /// Create an engine. With no goal id the engine stays idle.
    pub fn new(
        goal_id: Option<GoalId>,
        goals: Arc<dyn GoalSource>,
        state: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            goal_id,
            goals,
            state,
            status: SessionStatus::Uninitialized,
            session: None,
            restored: false,
        }
    }

    pub fn goal_id(&self) -> Option<&GoalId> {
        self.goal_id.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map(|s| s.status())
            .unwrap_or(self.status)
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_running())
    }

    /// Fetch the goal and build the session
    pub async fn initialize(&mut self) -> Result<Option<CoreEvent>, StudyTimerError> {
        let Some(load) = self.begin_load() else {
            return Ok(None);
        };
        let fetched = load.fetch().await;
        self.complete_load(fetched).map(Some)
    }

    /// Enter `Loading` and hand out the fetch to run.
    ///
    /// Returns `None` when there is no goal id.
    pub fn begin_load(&mut self) -> Option<GoalLoad> {
        let goal_id = self.goal_id.clone()?;

        self.session = None;
        self.restored = false;
        self.status = SessionStatus::Loading;
        debug!(goal_id = %goal_id, "Loading goal");

        Some(GoalLoad::new(goal_id, self.goals.clone()))
    }

    /// Finish a load started by [`Self::begin_load`]
    pub fn complete_load(
        &mut self,
        fetched: Result<GoalRecord, StudyTimerError>,
    ) -> Result<CoreEvent, StudyTimerError> {
        let Some(goal_id) = self.goal_id.clone() else {
            return Err(StudyTimerError::internal("no goal to load"));
        };

        let goal = match fetched {
            Ok(goal) => goal,
            Err(e) => {
                warn!(goal_id = %goal_id, error = %e, "Goal fetch failed");
                self.status = SessionStatus::Uninitialized;
                return Err(e);
            }
        };

        let total_seconds = parse_goal_time(&goal.goal_time);
        let session = match self.read_snapshot(&goal_id) {
            Some(snapshot) => {
                info!(
                    goal_id = %goal_id,
                    seconds_remaining = snapshot.seconds_left,
                    "Restoring timer progress"
                );
                TimerSession::restore(goal_id.clone(), goal.name, total_seconds, &snapshot)
            }
            None => {
                info!(goal_id = %goal_id, total_seconds, "Starting fresh timer");
                TimerSession::fresh(goal_id.clone(), goal.name, total_seconds)
            }
        };

        let event = CoreEvent::SessionLoaded {
            goal_id,
            status: session.status(),
            seconds_remaining: session.seconds_remaining(),
        };
        self.status = session.status();
        self.session = Some(session);
        self.restored = true;

        Ok(event)
    }

    /// Choose the fill flavor. Always permitted while a session exists.
    pub fn select_flavor(&mut self, flavor: impl Into<String>) -> Option<CoreEvent> {
        let session = self.session.as_mut()?;
        let flavor = flavor.into();
        session.select_flavor(flavor.clone());
        debug!(goal_id = %session.goal_id(), flavor = %flavor, "Flavor selected");
        self.persist();
        Some(CoreEvent::FlavorSelected { flavor })
    }

    /// Start or pause the countdown.
    ///
    /// Without a flavor this fails with [`TimerError::FlavorRequired`] and
    /// nothing changes, including stored state.
    pub fn toggle_running(&mut self) -> Result<CoreEvent, TimerError> {
        let session = self.session.as_mut().ok_or(TimerError::NoSession)?;
        let running = session.toggle_running()?;
        info!(
            goal_id = %session.goal_id(),
            running,
            seconds_remaining = session.seconds_remaining(),
            "Timer toggled"
        );
        self.persist();
        Ok(CoreEvent::RunningChanged { running })
    }

    /// One elapsed second. A no-op unless running.
    pub fn tick(&mut self) -> Option<CoreEvent> {
        let session = self.session.as_mut()?;
        match session.tick() {
            TickOutcome::Idle => None,
            TickOutcome::Decremented { seconds_remaining } => {
                self.persist();
                Some(CoreEvent::Ticked { seconds_remaining })
            }
            TickOutcome::Completed => {
                let goal_id = session.goal_id().clone();
                info!(goal_id = %goal_id, "Timer complete");
                self.remove_snapshot(&goal_id);
                Some(CoreEvent::Completed { goal_id })
            }
        }
    }

    /// Open the "leave this timer?" confirmation
    pub fn request_stop(&mut self) -> Option<CoreEvent> {
        let session = self.session.as_mut()?;
        session
            .request_stop()
            .then_some(CoreEvent::StopPromptChanged { open: true })
    }

    pub fn cancel_stop(&mut self) -> Option<CoreEvent> {
        let session = self.session.as_mut()?;
        session
            .cancel_stop()
            .then_some(CoreEvent::StopPromptChanged { open: false })
    }

    /// Leave the timer. The stored snapshot is kept so the countdown can
    /// resume from here next time.
    pub fn confirm_stop(&mut self) -> Option<CoreEvent> {
        let session = self.end_session()?;
        let goal_id = session.goal_id().clone();
        info!(
            goal_id = %goal_id,
            seconds_remaining = session.seconds_remaining(),
            "Timer abandoned, progress kept"
        );
        Some(CoreEvent::Abandoned {
            goal_id,
            seconds_remaining: session.seconds_remaining(),
        })
    }

    /// Leave the timer and delete its stored snapshot
    pub fn discard_progress(&mut self) -> Option<CoreEvent> {
        let session = self.end_session()?;
        let goal_id = session.goal_id().clone();
        self.remove_snapshot(&goal_id);
        info!(goal_id = %goal_id, "Timer progress discarded");
        Some(CoreEvent::ProgressDiscarded { goal_id })
    }

    /// Dismiss the completion notice
    pub fn acknowledge_completion(&mut self) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.acknowledge_completion())
    }

    pub fn view(&self) -> SessionView {
        match &self.session {
            Some(session) => session.view(),
            None => SessionView::idle(self.goal_id.clone(), self.status),
        }
    }

    fn end_session(&mut self) -> Option<TimerSession> {
        let session = self.session.take()?;
        self.restored = false;
        self.status = SessionStatus::Uninitialized;
        Some(session)
    }

    /// Stored snapshot, if one exists and has time left
    fn read_snapshot(&self, goal_id: &GoalId) -> Option<TimerSnapshot> {
        match self.state.get(&snapshot_key(goal_id)) {
            Ok(Some(raw)) => {
                let snapshot = TimerSnapshot::restorable(&raw);
                if snapshot.is_none() {
                    debug!(goal_id = %goal_id, "Ignoring unusable timer snapshot");
                }
                snapshot
            }
            Ok(None) => None,
            Err(e) => {
                warn!(goal_id = %goal_id, error = %e, "Failed to read timer snapshot");
                None
            }
        }
    }

    /// Full overwrite of the stored snapshot. Failures only degrade to
    /// in-memory operation.
    fn persist(&self) {
        if !self.restored {
            return;
        }
        let Some(session) = &self.session else {
            return;
        };
        if session.is_complete() {
            return;
        }

        let key = snapshot_key(session.goal_id());
        let result = session
            .snapshot()
            .encode()
            .map_err(|e| e.to_string())
            .and_then(|value| self.state.set(&key, &value).map_err(|e| e.to_string()));

        if let Err(e) = result {
            warn!(goal_id = %session.goal_id(), error = %e, "Failed to write timer snapshot");
        }
    }

    fn remove_snapshot(&self, goal_id: &GoalId) {
        if let Err(e) = self.state.remove(&snapshot_key(goal_id)) {
            warn!(goal_id = %goal_id, error = %e, "Failed to remove timer snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemoryState, StaticGoalSource};

    fn goal_id() -> GoalId {
        GoalId::new("goal-1")
    }

    fn engine_with(goal_time: &str) -> (TimerEngine, Arc<MemoryState>) {
        let goals = Arc::new(StaticGoalSource::new().with_goal(goal_id(), "Read", goal_time));
        let state = Arc::new(MemoryState::new());
        let engine = TimerEngine::new(Some(goal_id()), goals, state.clone());
        (engine, state)
    }

    fn stored(state: &MemoryState) -> Option<TimerSnapshot> {
        state
            .value(&snapshot_key(&goal_id()))
            .and_then(|raw| TimerSnapshot::restorable(&raw))
    }

    #[tokio::test]
    async fn test_no_goal_id_stays_idle() {
        let goals = Arc::new(StaticGoalSource::new());
        let state = Arc::new(MemoryState::new());
        let mut engine = TimerEngine::new(None, goals.clone(), state.clone());

        assert_eq!(engine.initialize().await, Ok(None));
        assert_eq!(engine.status(), SessionStatus::Uninitialized);
        assert_eq!(goals.fetch_count(), 0);
        assert_eq!(state.reads(), 0);
    }

    #[tokio::test]
    async fn test_fresh_initialization() {
        let (mut engine, state) = engine_with("00:02");

        let event = engine.initialize().await.unwrap().unwrap();
        assert_eq!(
            event,
            CoreEvent::SessionLoaded {
                goal_id: goal_id(),
                status: SessionStatus::Fresh,
                seconds_remaining: 120,
            }
        );
        let view = engine.view();
        assert_eq!(view.total_seconds, 120);
        assert_eq!(view.seconds_remaining, 120);
        assert_eq!(view.selected_flavor, None);
        assert_eq!(view.goal_name.as_deref(), Some("Read"));

        // Initialization alone writes nothing
        assert_eq!(state.writes(), 0);
    }

    #[tokio::test]
    async fn test_malformed_goal_time_is_zero() {
        let (mut engine, _) = engine_with("soon");
        engine.initialize().await.unwrap();
        assert_eq!(engine.view().total_seconds, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_uninitialized() {
        let goals = Arc::new(
            StaticGoalSource::new().with_error(goal_id(), StudyTimerError::auth("Not authorized")),
        );
        let state = Arc::new(MemoryState::new());
        let mut engine = TimerEngine::new(Some(goal_id()), goals, state.clone());

        let result = engine.initialize().await;
        assert_eq!(result, Err(StudyTimerError::auth("Not authorized")));
        assert_eq!(engine.status(), SessionStatus::Uninitialized);
        assert!(engine.session().is_none());
        assert!(!engine.view().status.has_countdown());

        // No persistence access at all
        assert_eq!(state.reads(), 0);
        assert_eq!(state.writes(), 0);
        assert_eq!(state.removes(), 0);
    }

    #[tokio::test]
    async fn test_loading_status_during_fetch() {
        let (mut engine, _) = engine_with("00:10");
        let load = engine.begin_load().unwrap();
        assert_eq!(engine.status(), SessionStatus::Loading);
        assert_eq!(load.goal_id(), &goal_id());

        let fetched = load.fetch().await;
        engine.complete_load(fetched).unwrap();
        assert_eq!(engine.status(), SessionStatus::Fresh);
    }

    #[tokio::test]
    async fn test_restore_from_snapshot() {
        let (mut engine, state) = engine_with("01:00");
        state.insert(
            &snapshot_key(&goal_id()),
            r##"{"secondsLeft":45,"isRunning":true,"selectedJuice":"#60A5FA"}"##,
        );

        engine.initialize().await.unwrap();
        let view = engine.view();
        assert_eq!(view.status, SessionStatus::Restored);
        assert_eq!(view.seconds_remaining, 45);
        assert!(!view.running);
        assert_eq!(view.selected_flavor.as_deref(), Some("#60A5FA"));
    }

    #[tokio::test]
    async fn test_last_two_seconds_complete() {
        let (mut engine, state) = engine_with("00:02");
        state.insert(
            &snapshot_key(&goal_id()),
            r##"{"secondsLeft":2,"isRunning":false,"selectedJuice":"#60A5FA"}"##,
        );
        engine.initialize().await.unwrap();
        engine.toggle_running().unwrap();

        assert_eq!(engine.tick(), Some(CoreEvent::Ticked { seconds_remaining: 1 }));
        let view = engine.view();
        assert_eq!(view.seconds_remaining, 1);
        assert!(view.running);
        assert_eq!(stored(&state).unwrap().seconds_left, 1);

        assert_eq!(engine.tick(), Some(CoreEvent::Completed { goal_id: goal_id() }));
        let view = engine.view();
        assert_eq!(view.seconds_remaining, 0);
        assert!(!view.running);
        assert_eq!(view.status, SessionStatus::Complete);
        assert!(state.value(&snapshot_key(&goal_id())).is_none());
    }

    #[tokio::test]
    async fn test_unusable_snapshots_start_fresh() {
        for raw in [
            r#"{"secondsLeft":0,"isRunning":false,"selectedJuice":null}"#,
            r#"{"secondsLeft":"12"}"#,
            "{broken",
        ] {
            let (mut engine, state) = engine_with("00:30");
            state.insert(&snapshot_key(&goal_id()), raw);
            engine.initialize().await.unwrap();
            assert_eq!(engine.status(), SessionStatus::Fresh, "snapshot {raw}");
            assert_eq!(engine.view().seconds_remaining, 1800);
        }
    }

    #[tokio::test]
    async fn test_read_failure_starts_fresh() {
        let (mut engine, state) = engine_with("00:30");
        state.insert(&snapshot_key(&goal_id()), r#"{"secondsLeft":10}"#);
        state.fail_reads(true);

        engine.initialize().await.unwrap();
        assert_eq!(engine.status(), SessionStatus::Fresh);
    }

    #[tokio::test]
    async fn test_toggle_without_flavor_changes_nothing() {
        let (mut engine, state) = engine_with("00:10");
        engine.initialize().await.unwrap();
        let before = engine.view();

        assert_eq!(engine.toggle_running(), Err(TimerError::FlavorRequired));
        assert_eq!(engine.view(), before);
        assert_eq!(state.writes(), 0);
    }

    #[tokio::test]
    async fn test_every_mutation_writes_snapshot() {
        let (mut engine, state) = engine_with("00:10");
        engine.initialize().await.unwrap();

        engine.select_flavor("#EC4899");
        assert_eq!(state.writes(), 1);
        let snap = stored(&state).unwrap();
        assert_eq!(snap.seconds_left, 600);
        assert!(!snap.is_running);
        assert_eq!(snap.selected_juice.as_deref(), Some("#EC4899"));

        engine.toggle_running().unwrap();
        assert!(stored(&state).unwrap().is_running);

        engine.tick();
        assert_eq!(stored(&state).unwrap().seconds_left, 599);
        assert_eq!(state.writes(), 3);

        // Ticks while paused write nothing
        engine.toggle_running().unwrap();
        assert_eq!(engine.tick(), None);
        assert_eq!(state.writes(), 4);
    }

    #[tokio::test]
    async fn test_run_to_completion_deletes_snapshot() {
        let (mut engine, state) = engine_with("00:01");
        engine.initialize().await.unwrap();
        engine.select_flavor("#F97316");
        engine.toggle_running().unwrap();

        let total = engine.view().total_seconds;
        let mut last = None;
        for _ in 0..total {
            last = engine.tick();
        }

        assert_eq!(last, Some(CoreEvent::Completed { goal_id: goal_id() }));
        let view = engine.view();
        assert_eq!(view.seconds_remaining, 0);
        assert!(!view.running);
        assert_eq!(view.status, SessionStatus::Complete);
        assert!(view.completion_notice);
        assert!(state.value(&snapshot_key(&goal_id())).is_none());

        assert!(engine.acknowledge_completion());
        assert!(!engine.view().completion_notice);
        assert!(state.value(&snapshot_key(&goal_id())).is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_not_fatal() {
        let (mut engine, state) = engine_with("00:10");
        engine.initialize().await.unwrap();
        state.fail_writes(true);

        engine.select_flavor("#22C55E");
        engine.toggle_running().unwrap();
        engine.tick();
        assert_eq!(engine.view().seconds_remaining, 599);
        assert!(engine.is_running());
    }

    #[tokio::test]
    async fn test_abandon_keeps_snapshot() {
        let (mut engine, state) = engine_with("00:10");
        engine.initialize().await.unwrap();
        engine.select_flavor("#60A5FA");
        engine.toggle_running().unwrap();
        engine.tick();

        assert!(engine.request_stop().is_some());
        assert!(engine.view().stop_prompt);
        assert_eq!(
            engine.cancel_stop(),
            Some(CoreEvent::StopPromptChanged { open: false })
        );
        engine.request_stop();

        let event = engine.confirm_stop().unwrap();
        assert_eq!(
            event,
            CoreEvent::Abandoned {
                goal_id: goal_id(),
                seconds_remaining: 599
            }
        );
        assert_eq!(engine.status(), SessionStatus::Uninitialized);
        assert_eq!(engine.tick(), None);
        assert_eq!(stored(&state).unwrap().seconds_left, 599);

        // Reopening resumes, paused
        engine.initialize().await.unwrap();
        let view = engine.view();
        assert_eq!(view.status, SessionStatus::Restored);
        assert_eq!(view.seconds_remaining, 599);
        assert!(!view.running);
    }

    #[tokio::test]
    async fn test_discard_progress_removes_snapshot() {
        let (mut engine, state) = engine_with("00:10");
        engine.initialize().await.unwrap();
        engine.select_flavor("#60A5FA");
        assert!(state.value(&snapshot_key(&goal_id())).is_some());

        assert_eq!(
            engine.discard_progress(),
            Some(CoreEvent::ProgressDiscarded { goal_id: goal_id() })
        );
        assert!(state.value(&snapshot_key(&goal_id())).is_none());

        engine.initialize().await.unwrap();
        assert_eq!(engine.status(), SessionStatus::Fresh);
    }

    #[tokio::test]
    async fn test_complete_session_restarts_fresh() {
        let (mut engine, _) = engine_with("00:01");
        engine.initialize().await.unwrap();
        engine.select_flavor("#60A5FA");
        engine.toggle_running().unwrap();
        while engine.tick() != Some(CoreEvent::Completed { goal_id: goal_id() }) {}

        engine.initialize().await.unwrap();
        assert_eq!(engine.status(), SessionStatus::Fresh);
        assert_eq!(engine.view().seconds_remaining, 60);
    }
}
