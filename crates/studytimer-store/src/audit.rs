//! Audit event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studytimer_util::{GoalId, UserId};

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    UserRegistered { user_id: UserId, email: String },

    /// Login rejected (unknown email, bad password or throttled)
    LoginFailed { email: String, reason: String },

    GoalCreated { goal_id: GoalId, owner: UserId },

    GoalUpdated { goal_id: GoalId, owner: UserId },

    GoalDeleted { goal_id: GoalId, owner: UserId },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: studytimer_util::now(),
            event,
        }
    }
}
