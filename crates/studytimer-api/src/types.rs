//! REST request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studytimer_util::{GoalDuration, GoalId, StudyTimerError, UserId, parse_goal_time};

/// A goal record as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    /// Owning account
    pub user: UserId,
    pub goal_name: String,
    /// Target duration, `HH:MM`
    pub goal_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Target duration in whole seconds (zero if the stored text is malformed)
    pub fn total_seconds(&self) -> u64 {
        parse_goal_time(&self.goal_time)
    }
}

/// Body of `POST /api/goals`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    #[serde(default)]
    pub goal_name: Option<String>,
    #[serde(default)]
    pub goal_time: Option<String>,
}

/// A goal creation request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidGoal {
    pub name: String,
    pub duration: GoalDuration,
}

impl NewGoal {
    pub fn new(goal_name: impl Into<String>, goal_time: impl Into<String>) -> Self {
        Self {
            goal_name: Some(goal_name.into()),
            goal_time: Some(goal_time.into()),
        }
    }

    pub fn validate(&self) -> Result<ValidGoal, StudyTimerError> {
        let name = self.goal_name.as_deref().map(str::trim).unwrap_or_default();
        let time = self.goal_time.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() || time.is_empty() {
            return Err(StudyTimerError::validation("All fields are required"));
        }

        let duration = GoalDuration::parse(time)
            .map_err(|e| StudyTimerError::validation(format!("Invalid goal time '{}': {}", time, e)))?;

        Ok(ValidGoal {
            name: name.to_string(),
            duration,
        })
    }
}

/// Body of `PUT /api/goals/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_time: Option<String>,
}

/// A validated partial update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalChanges {
    pub name: Option<String>,
    pub duration: Option<GoalDuration>,
}

impl GoalUpdate {
    pub fn validate(&self) -> Result<GoalChanges, StudyTimerError> {
        let name = match self.goal_name.as_deref().map(str::trim) {
            Some("") => return Err(StudyTimerError::validation("Goal name cannot be empty")),
            other => other.map(str::to_string),
        };

        let duration = match self.goal_time.as_deref().map(str::trim) {
            Some(time) => Some(GoalDuration::parse(time).map_err(|e| {
                StudyTimerError::validation(format!("Invalid goal time '{}': {}", time, e))
            })?),
            None => None,
        };

        Ok(GoalChanges { name, duration })
    }
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub token: String,
    pub user_id: UserId,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
}

/// Plain confirmation body, e.g. `{"message": "Goal removed"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned with every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub live: bool,
    pub store_ok: bool,
    pub api_version: u32,
}
