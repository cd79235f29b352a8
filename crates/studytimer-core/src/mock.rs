//! In-memory goal source and local state for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use studytimer_store::{KeyValueStore, StoreError, StoreResult};
use studytimer_util::{GoalId, StudyTimerError};

use crate::{GoalRecord, GoalSource};

/// Goal source answering from a fixed table
#[derive(Default)]
pub struct StaticGoalSource {
    goals: Mutex<HashMap<GoalId, Result<GoalRecord, StudyTimerError>>>,
    fetches: AtomicUsize,
}

impl StaticGoalSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goal(self, id: GoalId, name: &str, goal_time: &str) -> Self {
        self.set(
            id,
            Ok(GoalRecord {
                name: name.to_string(),
                goal_time: goal_time.to_string(),
            }),
        );
        self
    }

    /// Make fetches of `id` fail with `error`
    pub fn with_error(self, id: GoalId, error: StudyTimerError) -> Self {
        self.set(id, Err(error));
        self
    }

    pub fn set(&self, id: GoalId, answer: Result<GoalRecord, StudyTimerError>) {
        self.goals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, answer);
    }

    /// Number of fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GoalSource for StaticGoalSource {
    async fn fetch_goal(&self, id: &GoalId) -> Result<GoalRecord, StudyTimerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.goals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(StudyTimerError::not_found("Goal not found")))
    }
}

/// Key-value state with access counters and injectable failures
#[derive(Default)]
pub struct MemoryState {
    values: Mutex<HashMap<String, String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    removes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write
    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    /// Peek at a value without counting it as a read
    pub fn value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `set` and `remove` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStore for MemoryState {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected read failure".into()));
        }
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected write failure".into()));
        }
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected write failure".into()));
        }
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
