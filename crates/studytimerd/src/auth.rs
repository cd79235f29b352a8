//! Bearer tokens and the authentication middleware

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use studytimer_util::UserId;
use tracing::debug;

use crate::{ApiError, ApiResult, AppState};

/// Issues and checks HS256 bearer tokens
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account id
    sub: String,
    exp: usize,
    iat: usize,
}

/// The authenticated account, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

impl TokenManager {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &UserId) -> ApiResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| ApiError::Internal("System clock is before UNIX_EPOCH".into()))?;
        let claims = Claims {
            sub: user.to_string(),
            iat: now.as_secs() as usize,
            exp: now
                .checked_add(self.ttl)
                .ok_or_else(|| ApiError::Internal("Token lifetime out of range".into()))?
                .as_secs() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
    }

    /// The account a token was issued to
    pub fn validate(&self, token: &str) -> ApiResult<UserId> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| UserId::new(data.claims.sub))
            .map_err(|err| {
                debug!(error = ?err.kind(), "Token rejected");
                ApiError::Unauthorized("Not authorized, token failed".into())
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Reject requests without a valid token for an existing account
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".into()))?;

    let user_id = state.tokens.validate(token)?;
    if state.store.get_user(&user_id)?.is_none() {
        return Err(ApiError::Unauthorized("Not authorized, user not found".into()));
    }

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn issue_and_validate() {
        let tokens = TokenManager::new(SECRET, Duration::from_secs(60));
        let user = UserId::new("u1");
        let token = tokens.issue(&user).unwrap();
        assert_eq!(tokens.validate(&token).unwrap(), user);
    }

    #[test]
    fn rejects_foreign_signature() {
        let ours = TokenManager::new(SECRET, Duration::from_secs(60));
        let theirs = TokenManager::new(b"another-secret-another-secret-xx", Duration::from_secs(60));
        let token = theirs.issue(&UserId::new("u1")).unwrap();
        assert!(matches!(ours.validate(&token), Err(ApiError::Unauthorized(_))));
        assert!(ours.validate("garbage").is_err());
    }

    #[test]
    fn rejects_expired() {
        let tokens = TokenManager::new(SECRET, Duration::ZERO);
        let token = tokens.issue(&UserId::new("u1")).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        assert!(tokens.validate(&token).is_err());
    }

    #[test]
    fn out_of_range_ttl_is_an_error() {
        let tokens = TokenManager::new(SECRET, Duration::MAX);
        assert!(matches!(
            tokens.issue(&UserId::new("u1")),
            Err(ApiError::Internal(_))
        ));
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
