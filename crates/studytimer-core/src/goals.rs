//! Goal-fetch capability consumed by the engine

use async_trait::async_trait;
use std::sync::Arc;
use studytimer_util::{GoalId, StudyTimerError};

/// The parts of a goal the timer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalRecord {
    pub name: String,
    /// Target duration text, `HH:MM`
    pub goal_time: String,
}

/// Something that can look up a goal by id
#[async_trait]
pub trait GoalSource: Send + Sync {
    /// Fails with `NotFound`, `Auth` or `Network`
    async fn fetch_goal(&self, id: &GoalId) -> Result<GoalRecord, StudyTimerError>;
}

/// A goal fetch that has been scheduled but not yet run.
///
/// Lets the caller await the fetch without holding the engine.
pub struct GoalLoad {
    goal_id: GoalId,
    source: Arc<dyn GoalSource>,
}

impl GoalLoad {
    pub(crate) fn new(goal_id: GoalId, source: Arc<dyn GoalSource>) -> Self {
        Self { goal_id, source }
    }

    pub fn goal_id(&self) -> &GoalId {
        &self.goal_id
    }

    pub async fn fetch(&self) -> Result<GoalRecord, StudyTimerError> {
        self.source.fetch_goal(&self.goal_id).await
    }
}
