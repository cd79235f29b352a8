//! Registration and login

use std::sync::{Arc, PoisonError};

use argon2::{
    Argon2,
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{Json, extract::State, http::StatusCode};
use rand::rngs::OsRng;
use studytimer_api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use studytimer_store::{AuditEvent, AuditEventType, NewUser};
use tracing::{info, warn};

use crate::{ApiError, ApiResult, AppState};

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// Ok(false) on a wrong password
fn verify_password(candidate: &str, stored_hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("Invalid stored password hash: {e}")))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(other) => Err(ApiError::Internal(format!(
            "Password verification failed: {other}"
        ))),
    }
}

/// Run CPU-heavy password work off the async workers
async fn blocking<T: Send + 'static>(
    f: impl FnOnce() -> ApiResult<T> + Send + 'static,
) -> ApiResult<T> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Password task failed: {e}")))?
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let password = req.password;
    let password_hash = blocking(move || hash_password(&password)).await?;

    let user = state.store.create_user(&NewUser {
        username,
        email: email.clone(),
        password_hash,
    })?;

    let _ = state
        .store
        .append_audit(AuditEvent::new(AuditEventType::UserRegistered {
            user_id: user.id.clone(),
            email,
        }));
    info!(user_id = %user.id, "User registered");

    let token = state.tokens.issue(&user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token,
            user_id: user.id,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let allowed = state
        .login_limiter
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .check(&email);
    if !allowed {
        warn!(email = %email, "Login throttled");
        audit_login_failure(&state, &email, "throttled");
        return Err(ApiError::TooManyRequests(
            "Too many login attempts, try again later".into(),
        ));
    }

    let Some(user) = state.store.find_user_by_email(&email)? else {
        audit_login_failure(&state, &email, "unknown email");
        return Err(ApiError::NotFound("User not found".into()));
    };

    let password = req.password;
    let stored_hash = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &stored_hash)).await? {
        audit_login_failure(&state, &email, "invalid password");
        return Err(ApiError::Unauthorized("Invalid password".into()));
    }

    state
        .login_limiter
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .reset(&email);

    let token = state.tokens.issue(&user.id)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

fn audit_login_failure(state: &AppState, email: &str, reason: &str) {
    let _ = state
        .store
        .append_audit(AuditEvent::new(AuditEventType::LoginFailed {
            email: email.to_string(),
            reason: reason.to_string(),
        }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
        assert!(verify_password("hunter2", "not-a-hash").is_err());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
