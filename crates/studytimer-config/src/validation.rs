//! Configuration validation

use crate::schema::RawConfig;
use std::net::SocketAddr;
use thiserror::Error;

/// Minimum length of an HMAC secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime
pub const MAX_TOKEN_TTL_DAYS: u64 = 3650;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid listen address '{value}': {message}")]
    InvalidListenAddr { value: String, message: String },

    #[error("Invalid API URL '{0}': must start with http:// or https://")]
    InvalidApiUrl(String),

    #[error("CORS origin cannot be empty")]
    EmptyCorsOrigin,

    #[error("Auth config error: {0}")]
    AuthError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(addr) = &config.server.listen_addr {
        if let Err(e) = addr.parse::<SocketAddr>() {
            errors.push(ValidationError::InvalidListenAddr {
                value: addr.clone(),
                message: e.to_string(),
            });
        }
    }

    if let Some(origins) = &config.server.cors_allow_origins {
        if origins.iter().any(|o| o.trim().is_empty()) {
            errors.push(ValidationError::EmptyCorsOrigin);
        }
    }

    match config.auth.token_ttl_days {
        Some(0) => errors.push(ValidationError::AuthError(
            "token_ttl_days must be greater than zero".into(),
        )),
        Some(days) if days > MAX_TOKEN_TTL_DAYS => errors.push(ValidationError::AuthError(
            format!("token_ttl_days must be at most {}", MAX_TOKEN_TTL_DAYS),
        )),
        _ => {}
    }

    if config.auth.login_attempts_per_minute == Some(0) {
        errors.push(ValidationError::AuthError(
            "login_attempts_per_minute must be greater than zero".into(),
        ));
    }

    if let Some(secret) = &config.auth.jwt_secret {
        if let Err(e) = validate_jwt_secret(secret) {
            errors.push(e);
        }
    }

    if let Some(url) = &config.client.api_url {
        if !is_http_url(url) {
            errors.push(ValidationError::InvalidApiUrl(url.clone()));
        }
    }

    errors
}

/// Check a token secret, wherever it came from
pub fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    if secret.len() < MIN_JWT_SECRET_LEN {
        return Err(ValidationError::AuthError(format!(
            "jwt_secret must be at least {} bytes",
            MIN_JWT_SECRET_LEN
        )));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    matches!(rest, Some(host) if !host.is_empty())
}
