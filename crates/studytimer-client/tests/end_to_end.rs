//! Client against a live service
//!
//! Each test binds the service router on an ephemeral port and talks to it
//! over real HTTP.

use std::sync::Arc;
use std::time::Duration;
use studytimer_api::{GoalUpdate, NewGoal, SessionStatus, TimerSnapshot, snapshot_key};
use studytimer_client::{ApiClient, AuthSession, Screen, SessionGate, TimerDriver};
use studytimer_core::TimerEngine;
use studytimer_core::mock::MemoryState;
use studytimer_store::{KeyValueStore, SqliteStore};
use studytimer_util::{GoalId, StudyTimerError};
use studytimerd::{AppState, TokenManager, app_router};

async fn spawn_service() -> String {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let tokens = TokenManager::new(
        b"end-to-end-secret-end-to-end-secret",
        Duration::from_secs(3600),
    );
    let state = Arc::new(AppState::new(store, tokens, 10));
    let app = app_router(state, &["*".to_string()]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> (ApiClient, Arc<MemoryState>) {
    let state = Arc::new(MemoryState::new());
    let session = AuthSession::load(state.clone());
    (ApiClient::new(base, session).unwrap(), state)
}

#[tokio::test]
async fn test_register_add_goal_and_start_fresh() {
    let base = spawn_service().await;
    let (api, state) = client(&base);

    assert!(api.health().await.unwrap().live);

    api.register("ana", "ana@example.com", "hunter22").await.unwrap();
    assert!(api.session().is_authenticated());
    assert!(state.value("token").is_some());

    let goal = api.create_goal(&NewGoal::new("Read", "00:02")).await.unwrap();
    assert_eq!(api.list_goals().await.unwrap().len(), 1);

    let engine = TimerEngine::new(Some(goal.id.clone()), Arc::new(api.clone()), state.clone());
    let driver = TimerDriver::new(engine);
    driver.initialize().await.unwrap();

    let view = driver.view().await;
    assert_eq!(view.status, SessionStatus::Fresh);
    assert_eq!(view.total_seconds, 120);
    assert_eq!(view.seconds_remaining, 120);
    assert_eq!(view.display, "02:00");
    assert!(!view.running);
}

#[tokio::test]
async fn test_snapshot_restores_across_drivers() {
    let base = spawn_service().await;
    let (api, _) = client(&base);
    api.register("ana", "ana@example.com", "hunter22").await.unwrap();
    let goal = api.create_goal(&NewGoal::new("Write", "01:00")).await.unwrap();

    let local: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let snapshot = TimerSnapshot {
        seconds_left: 90,
        is_running: true,
        selected_juice: Some("#ff6b6b".to_string()),
    };
    local
        .set(&snapshot_key(&goal.id), &snapshot.encode().unwrap())
        .unwrap();

    let driver = TimerDriver::new(TimerEngine::new(
        Some(goal.id.clone()),
        Arc::new(api.clone()),
        local,
    ));
    driver.initialize().await.unwrap();

    let view = driver.view().await;
    assert_eq!(view.status, SessionStatus::Restored);
    assert_eq!(view.seconds_remaining, 90);
    assert!(!view.running);
    assert_eq!(view.selected_flavor.as_deref(), Some("#ff6b6b"));
    assert!(!driver.is_armed());
}

#[tokio::test]
async fn test_foreign_goal_is_refused() {
    let base = spawn_service().await;

    let (owner, _) = client(&base);
    owner.register("ana", "ana@example.com", "hunter22").await.unwrap();
    let goal = owner.create_goal(&NewGoal::new("Read", "00:30")).await.unwrap();

    let (other, _) = client(&base);
    other.register("bo", "bo@example.com", "hunter22").await.unwrap();
    let timer_state = Arc::new(MemoryState::new());

    let err = other.get_goal(&goal.id).await.unwrap_err();
    assert!(matches!(err, StudyTimerError::Auth(_)));

    let driver = TimerDriver::new(TimerEngine::new(
        Some(goal.id.clone()),
        Arc::new(other.clone()),
        timer_state.clone(),
    ));
    let mut events = driver.subscribe();
    assert!(driver.initialize().await.is_err());
    assert_eq!(driver.view().await.status, SessionStatus::Uninitialized);
    assert!(matches!(
        events.recv().await.unwrap(),
        studytimer_core::CoreEvent::LoadFailed { .. }
    ));
    assert_eq!(timer_state.reads(), 0);
    assert_eq!(timer_state.writes(), 0);
}

#[tokio::test]
async fn test_update_and_delete_round_trip() {
    let base = spawn_service().await;
    let (api, _) = client(&base);
    api.register("ana", "ana@example.com", "hunter22").await.unwrap();
    let goal = api.create_goal(&NewGoal::new("Read", "00:30")).await.unwrap();

    let update = GoalUpdate {
        goal_name: None,
        goal_time: Some("01:15".to_string()),
    };
    let updated = api.update_goal(&goal.id, &update).await.unwrap();
    assert_eq!(updated.goal_name, "Read");
    assert_eq!(updated.goal_time, "01:15");

    let removed = api.delete_goal(&goal.id).await.unwrap();
    assert_eq!(removed.message, "Goal removed");

    let err = api.get_goal(&GoalId::new(goal.id.as_str())).await.unwrap_err();
    assert!(matches!(err, StudyTimerError::NotFound(_)));
}

#[tokio::test]
async fn test_login_with_wrong_password_keeps_signed_out() {
    let base = spawn_service().await;
    let (first, _) = client(&base);
    first.register("ana", "ana@example.com", "hunter22").await.unwrap();

    let (api, _) = client(&base);
    let gate = SessionGate::new(api.session().clone());

    let err = api.login("ana@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, StudyTimerError::Auth(_)));
    assert_eq!(gate.enter(Screen::Home), Err(Screen::Login));

    let response = api.login("ana@example.com", "hunter22").await.unwrap();
    assert_eq!(response.username, "ana");
    assert_eq!(gate.enter(Screen::Home), Ok(Screen::Home));
}
