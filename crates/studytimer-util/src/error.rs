//! Error types for studytimer

use thiserror::Error;

/// Error taxonomy shared by the desktop client and the REST service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudyTimerError {
    /// Malformed goal duration, empty name, missing fields
    #[error("{0}")]
    Validation(String),

    /// Missing, expired or invalid credentials
    #[error("{0}")]
    Auth(String),

    /// No such record, or the record belongs to another account
    #[error("{0}")]
    NotFound(String),

    /// Transport failure talking to the service
    #[error("Network error: {0}")]
    Network(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyTimerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for errors that mean the user has to log in again
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, StudyTimerError>;
