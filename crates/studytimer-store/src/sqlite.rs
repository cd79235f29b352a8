//! SQLite-based store implementation

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use studytimer_api::{Goal, GoalChanges, ValidGoal};
use studytimer_util::{GoalId, UserId};
use tracing::{debug, warn};

use crate::{AuditEvent, KeyValueStore, NewUser, Store, StoreError, StoreResult, UserRecord};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Accounts
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Goals
            CREATE TABLE IF NOT EXISTS goals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                goal_name TEXT NOT NULL,
                goal_time TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Local client state
            CREATE TABLE IF NOT EXISTS local_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id, created_at);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| studytimer_util::now())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let created_at: String = row.get(4)?;
    Ok(UserRecord {
        id: UserId::new(row.get::<_, String>(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(Goal {
        id: GoalId::new(row.get::<_, String>(0)?),
        user: UserId::new(row.get::<_, String>(1)?),
        goal_name: row.get(2)?,
        goal_time: row.get(3)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

const GOAL_COLUMNS: &str = "id, user_id, goal_name, goal_time, created_at, updated_at";

fn read_goal(conn: &Connection, id: &GoalId) -> StoreResult<Option<Goal>> {
    let goal = conn
        .query_row(
            &format!("SELECT {} FROM goals WHERE id = ?", GOAL_COLUMNS),
            [id.as_str()],
            goal_from_row,
        )
        .optional()?;
    Ok(goal)
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp: parse_timestamp(&timestamp_str),
                event,
            });
        }

        Ok(events)
    }

    fn create_user(&self, user: &NewUser) -> StoreResult<UserRecord> {
        let conn = self.conn()?;

        let taken: bool = conn
            .query_row("SELECT 1 FROM users WHERE email = ?", [&user.email], |_| Ok(()))
            .optional()?
            .is_some();
        if taken {
            return Err(StoreError::Conflict("Email already in use".into()));
        }

        let record = UserRecord {
            id: UserId::generate(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: studytimer_util::now(),
        };

        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                record.id.as_str(),
                record.username,
                record.email,
                record.password_hash,
                record.created_at.to_rfc3339()
            ],
        )?;

        debug!(user_id = %record.id, "User created");
        Ok(record)
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE email = ?",
                [email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user(&self, id: &UserId) -> StoreResult<Option<UserRecord>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?",
                [id.as_str()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn create_goal(&self, owner: &UserId, goal: &ValidGoal) -> StoreResult<Goal> {
        let conn = self.conn()?;
        let now = studytimer_util::now();

        let record = Goal {
            id: GoalId::generate(),
            user: owner.clone(),
            goal_name: goal.name.clone(),
            goal_time: goal.duration.to_string(),
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            &format!("INSERT INTO goals ({}) VALUES (?, ?, ?, ?, ?, ?)", GOAL_COLUMNS),
            params![
                record.id.as_str(),
                owner.as_str(),
                record.goal_name,
                record.goal_time,
                now.to_rfc3339(),
                now.to_rfc3339()
            ],
        )?;

        debug!(goal_id = %record.id, owner = %owner, "Goal created");
        Ok(record)
    }

    fn get_goal(&self, id: &GoalId) -> StoreResult<Option<Goal>> {
        let conn = self.conn()?;
        read_goal(&conn, id)
    }

    fn list_goals(&self, owner: &UserId) -> StoreResult<Vec<Goal>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM goals WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            GOAL_COLUMNS
        ))?;

        let goals = stmt
            .query_map([owner.as_str()], goal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(goals)
    }

    fn update_goal(&self, id: &GoalId, changes: &GoalChanges) -> StoreResult<Option<Goal>> {
        let conn = self.conn()?;

        let Some(mut goal) = read_goal(&conn, id)? else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            goal.goal_name = name.clone();
        }
        if let Some(duration) = changes.duration {
            goal.goal_time = duration.to_string();
        }
        goal.updated_at = studytimer_util::now();

        conn.execute(
            "UPDATE goals SET goal_name = ?, goal_time = ?, updated_at = ? WHERE id = ?",
            params![
                goal.goal_name,
                goal.goal_time,
                goal.updated_at.to_rfc3339(),
                id.as_str()
            ],
        )?;

        debug!(goal_id = %id, "Goal updated");
        Ok(Some(goal))
    }

    fn delete_goal(&self, id: &GoalId) -> StoreResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM goals WHERE id = ?", [id.as_str()])?;
        debug!(goal_id = %id, removed, "Goal delete");
        Ok(removed > 0)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM local_state WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO local_state (key, value)
            VALUES (?, ?)
            ON CONFLICT(key)
            DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM local_state WHERE key = ?", [key])?;
        Ok(())
    }
}
