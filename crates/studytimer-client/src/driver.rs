//! Drives a timer engine against the wall clock
//!
//! At most one periodic tick task is armed at a time. Arming always
//! disarms the previous task first.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use studytimer_api::SessionView;
use studytimer_core::{CoreEvent, TimerEngine, TimerError};
use studytimer_util::{StudyTimerError, TICK_INTERVAL};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

/// Owns a [`TimerEngine`] and its tick task
pub struct TimerDriver {
    engine: Arc<Mutex<TimerEngine>>,
    ticker: StdMutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<CoreEvent>,
}

impl TimerDriver {
    pub fn new(engine: TimerEngine) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: StdMutex::new(None),
            events,
        }
    }

    /// Engine events, including every tick
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: &CoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event.clone());
    }

    /// Whether a tick task is currently armed
    pub fn is_armed(&self) -> bool {
        self.ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    fn arm(&self) {
        self.disarm();

        let engine = self.engine.clone();
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            loop {
                interval.tick().await;

                let event = {
                    let mut engine = engine.lock().await;
                    if !engine.is_running() {
                        break;
                    }
                    engine.tick()
                };

                if let Some(event) = event {
                    let done = matches!(event, CoreEvent::Completed { .. });
                    let _ = events.send(event);
                    if done {
                        break;
                    }
                }
            }
            debug!("Tick task finished");
        });

        *self.ticker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        debug!("Tick task armed");
    }

    fn disarm(&self) {
        if let Some(handle) = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
            debug!("Tick task disarmed");
        }
    }

    /// Fetch the goal and restore or start the session.
    ///
    /// The engine is not locked while the fetch is in flight.
    pub async fn initialize(&self) -> Result<Option<CoreEvent>, StudyTimerError> {
        self.disarm();

        let load = self.engine.lock().await.begin_load();
        let Some(load) = load else {
            return Ok(None);
        };

        let goal_id = load.goal_id().clone();
        let fetched = load.fetch().await;
        let result = self.engine.lock().await.complete_load(fetched);

        match &result {
            Ok(event) => self.emit(event),
            Err(e) => self.emit(&CoreEvent::LoadFailed {
                goal_id,
                message: e.to_string(),
            }),
        }
        result.map(Some)
    }

    pub async fn select_flavor(&self, flavor: impl Into<String>) -> Option<CoreEvent> {
        let event = self.engine.lock().await.select_flavor(flavor);
        if let Some(event) = &event {
            self.emit(event);
        }
        event
    }

    /// Start or pause. Starting arms the tick task; pausing disarms it
    /// before the engine lock is released.
    pub async fn toggle_running(&self) -> Result<CoreEvent, TimerError> {
        let mut engine = self.engine.lock().await;
        let event = engine.toggle_running()?;
        if engine.is_running() {
            self.arm();
        } else {
            self.disarm();
        }
        drop(engine);

        self.emit(&event);
        Ok(event)
    }

    pub async fn request_stop(&self) -> Option<CoreEvent> {
        let event = self.engine.lock().await.request_stop();
        if let Some(event) = &event {
            self.emit(event);
        }
        event
    }

    pub async fn cancel_stop(&self) -> Option<CoreEvent> {
        let event = self.engine.lock().await.cancel_stop();
        if let Some(event) = &event {
            self.emit(event);
        }
        event
    }

    /// Leave the timer, keeping stored progress
    pub async fn confirm_stop(&self) -> Option<CoreEvent> {
        let mut engine = self.engine.lock().await;
        self.disarm();
        let event = engine.confirm_stop();
        drop(engine);

        if let Some(event) = &event {
            self.emit(event);
        }
        event
    }

    /// Leave the timer and delete stored progress
    pub async fn discard_progress(&self) -> Option<CoreEvent> {
        let mut engine = self.engine.lock().await;
        self.disarm();
        let event = engine.discard_progress();
        drop(engine);

        if let Some(event) = &event {
            self.emit(event);
        }
        event
    }

    pub async fn acknowledge_completion(&self) -> bool {
        self.engine.lock().await.acknowledge_completion()
    }

    pub async fn view(&self) -> SessionView {
        self.engine.lock().await.view()
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.disarm();
    }
}
