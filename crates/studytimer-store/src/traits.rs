//! Store trait definitions

use chrono::{DateTime, Utc};
use studytimer_api::{Goal, GoalChanges, ValidGoal};
use studytimer_util::{GoalId, UserId};

use crate::{AuditEvent, StoreResult};

/// Main store trait, backing the REST service
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Accounts

    /// Create an account. Fails with `Conflict` if the email is taken.
    fn create_user(&self, user: &NewUser) -> StoreResult<UserRecord>;

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    fn get_user(&self, id: &UserId) -> StoreResult<Option<UserRecord>>;

    // Goals

    fn create_goal(&self, owner: &UserId, goal: &ValidGoal) -> StoreResult<Goal>;

    fn get_goal(&self, id: &GoalId) -> StoreResult<Option<Goal>>;

    /// All goals owned by `owner`, newest first
    fn list_goals(&self, owner: &UserId) -> StoreResult<Vec<Goal>>;

    /// Apply a partial update; `None` if the goal does not exist
    fn update_goal(&self, id: &GoalId, changes: &GoalChanges) -> StoreResult<Option<Goal>>;

    /// Returns true if a goal was removed
    fn delete_goal(&self, id: &GoalId) -> StoreResult<bool>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

/// String key-value persistence for local client state.
///
/// Overwrites are whole-value; there is no merge.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Account to be created; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Stored account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
