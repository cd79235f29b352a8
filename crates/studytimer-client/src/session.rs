//! Process-wide credential holder
//!
//! Loaded from local state on start, persisted on sign-in, cleared on
//! sign-out. Subscribers are notified of every change.

use std::sync::Arc;
use studytimer_store::KeyValueStore;
use studytimer_util::{StudyTimerError, UserId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "userId";
pub const USERNAME_KEY: &str = "username";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: UserId,
    pub username: Option<String>,
}

/// Shared, cloneable handle to the signed-in account
#[derive(Clone)]
pub struct AuthSession {
    state: Arc<dyn KeyValueStore>,
    current: Arc<watch::Sender<Option<Credentials>>>,
}

impl AuthSession {
    /// Load any stored credentials
    pub fn load(state: Arc<dyn KeyValueStore>) -> Self {
        let stored = match Self::read(state.as_ref()) {
            Ok(creds) => creds,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                None
            }
        };
        debug!(authenticated = stored.is_some(), "Auth session loaded");

        let (tx, _rx) = watch::channel(stored);
        Self {
            state,
            current: Arc::new(tx),
        }
    }

    fn read(state: &dyn KeyValueStore) -> Result<Option<Credentials>, StudyTimerError> {
        let token = state.get(TOKEN_KEY)?;
        let user_id = state.get(USER_ID_KEY)?;
        let (Some(token), Some(user_id)) = (token, user_id) else {
            return Ok(None);
        };
        Ok(Some(Credentials {
            token,
            user_id: UserId::new(user_id),
            username: state.get(USERNAME_KEY)?,
        }))
    }

    pub fn current(&self) -> Option<Credentials> {
        self.current.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|c| c.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Receive every credential change
    pub fn subscribe(&self) -> watch::Receiver<Option<Credentials>> {
        self.current.subscribe()
    }

    pub fn sign_in(&self, creds: Credentials) -> Result<(), StudyTimerError> {
        self.state.set(TOKEN_KEY, &creds.token)?;
        self.state.set(USER_ID_KEY, creds.user_id.as_str())?;
        match &creds.username {
            Some(name) => self.state.set(USERNAME_KEY, name)?,
            None => self.state.remove(USERNAME_KEY)?,
        }

        info!(user_id = %creds.user_id, "Signed in");
        self.current.send_replace(Some(creds));
        Ok(())
    }

    /// Clear credentials. Subscribers are notified even if clearing
    /// local state fails.
    pub fn sign_out(&self) -> Result<(), StudyTimerError> {
        let result = [TOKEN_KEY, USER_ID_KEY, USERNAME_KEY]
            .into_iter()
            .try_for_each(|key| self.state.remove(key));

        info!("Signed out");
        self.current.send_replace(None);
        result.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studytimer_store::SqliteStore;

    fn creds() -> Credentials {
        Credentials {
            token: "tok".into(),
            user_id: UserId::new("u1"),
            username: Some("ana".into()),
        }
    }

    #[test]
    fn test_sign_in_persists() {
        let state = Arc::new(SqliteStore::in_memory().unwrap());
        let session = AuthSession::load(state.clone());
        assert!(!session.is_authenticated());

        session.sign_in(creds()).unwrap();
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(state.get(USER_ID_KEY).unwrap().as_deref(), Some("u1"));

        // A later process picks it up
        let reloaded = AuthSession::load(state);
        assert_eq!(reloaded.current(), Some(creds()));
    }

    #[test]
    fn test_sign_out_clears_and_notifies() {
        let state = Arc::new(SqliteStore::in_memory().unwrap());
        let session = AuthSession::load(state.clone());
        session.sign_in(creds()).unwrap();

        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());

        session.sign_out().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert!(state.get(TOKEN_KEY).unwrap().is_none());
        assert!(!AuthSession::load(state).is_authenticated());
    }

    #[test]
    fn test_token_without_user_is_ignored() {
        let state = Arc::new(SqliteStore::in_memory().unwrap());
        state.set(TOKEN_KEY, "tok").unwrap();
        assert!(!AuthSession::load(state).is_authenticated());
    }

    #[test]
    fn test_clones_share_state() {
        let state = Arc::new(SqliteStore::in_memory().unwrap());
        let session = AuthSession::load(state);
        let other = session.clone();
        session.sign_in(creds()).unwrap();
        assert!(other.is_authenticated());
    }
}
