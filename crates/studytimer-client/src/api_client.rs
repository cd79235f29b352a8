//! HTTP client for the studytimer service

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use studytimer_api::{
    ErrorBody, Goal, GoalUpdate, HealthStatus, LoginRequest, LoginResponse, MessageResponse,
    NewGoal, RegisterRequest, RegisterResponse,
};
use studytimer_core::{GoalRecord, GoalSource};
use studytimer_util::{GoalId, StudyTimerError};
use tracing::debug;

use crate::{AuthSession, Credentials};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the REST service. Requests that need a token take it from
/// the shared [`AuthSession`]; register and login update it.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: AuthSession,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: AuthSession) -> Result<Self, StudyTimerError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StudyTimerError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, StudyTimerError> {
        let token = self
            .session
            .token()
            .ok_or_else(|| StudyTimerError::auth("You must be logged in"))?;
        Ok(builder.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StudyTimerError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StudyTimerError::network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| StudyTimerError::network(format!("Invalid response: {e}")));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        debug!(status = %status, message = %message, "Request rejected");
        Err(error_for_status(status, message))
    }

    pub async fn health(&self) -> Result<HealthStatus, StudyTimerError> {
        self.send(self.http.get(self.url("/health"))).await
    }

    /// Create an account and sign in as it
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, StudyTimerError> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: RegisterResponse = self
            .send(self.http.post(self.url("/auth/register")).json(&body))
            .await?;

        self.session.sign_in(Credentials {
            token: response.token.clone(),
            user_id: response.user_id.clone(),
            username: Some(username.trim().to_string()),
        })?;
        Ok(response)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, StudyTimerError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send(self.http.post(self.url("/auth/login")).json(&body))
            .await?;

        self.session.sign_in(Credentials {
            token: response.token.clone(),
            user_id: response.user_id.clone(),
            username: Some(response.username.clone()),
        })?;
        Ok(response)
    }

    pub async fn list_goals(&self) -> Result<Vec<Goal>, StudyTimerError> {
        self.send(self.authorized(self.http.get(self.url("/goals")))?)
            .await
    }

    pub async fn get_goal(&self, id: &GoalId) -> Result<Goal, StudyTimerError> {
        self.send(self.authorized(self.http.get(self.url(&format!("/goals/{}", id))))?)
            .await
    }

    /// Validated locally before anything is sent
    pub async fn create_goal(&self, goal: &NewGoal) -> Result<Goal, StudyTimerError> {
        goal.validate()?;
        self.send(self.authorized(self.http.post(self.url("/goals")).json(goal))?)
            .await
    }

    pub async fn update_goal(&self, id: &GoalId, update: &GoalUpdate) -> Result<Goal, StudyTimerError> {
        update.validate()?;
        self.send(
            self.authorized(
                self.http
                    .put(self.url(&format!("/goals/{}", id)))
                    .json(update),
            )?,
        )
        .await
    }

    pub async fn delete_goal(&self, id: &GoalId) -> Result<MessageResponse, StudyTimerError> {
        self.send(self.authorized(self.http.delete(self.url(&format!("/goals/{}", id))))?)
            .await
    }
}

fn error_for_status(status: StatusCode, message: String) -> StudyTimerError {
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNPROCESSABLE_ENTITY
        | StatusCode::TOO_MANY_REQUESTS => StudyTimerError::Validation(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StudyTimerError::Auth(message),
        StatusCode::NOT_FOUND => StudyTimerError::NotFound(message),
        other => StudyTimerError::internal(format!("{}: {}", other, message)),
    }
}

#[async_trait]
impl GoalSource for ApiClient {
    async fn fetch_goal(&self, id: &GoalId) -> Result<GoalRecord, StudyTimerError> {
        let goal = self.get_goal(id).await?;
        Ok(GoalRecord {
            name: goal.goal_name,
            goal_time: goal.goal_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use studytimer_store::SqliteStore;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, "x".into()),
            StudyTimerError::Validation(_)
        ));
        assert!(error_for_status(StatusCode::UNAUTHORIZED, "x".into()).is_auth());
        assert_eq!(
            error_for_status(StatusCode::NOT_FOUND, "Goal not found".into()),
            StudyTimerError::not_found("Goal not found")
        );
        assert!(matches!(
            error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "x".into()),
            StudyTimerError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn test_protected_calls_need_credentials() {
        let session = AuthSession::load(Arc::new(SqliteStore::in_memory().unwrap()));
        // Nothing listens here; the call must fail before connecting
        let client = ApiClient::new("http://127.0.0.1:9", session).unwrap();
        let err = client.list_goals().await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_invalid_goal_rejected_locally() {
        let session = AuthSession::load(Arc::new(SqliteStore::in_memory().unwrap()));
        let client = ApiClient::new("http://127.0.0.1:9", session).unwrap();
        let err = client
            .create_goal(&NewGoal::new("Read", "90"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudyTimerError::Validation(_)));
    }

    #[test]
    fn test_url_building() {
        let session = AuthSession::load(Arc::new(SqliteStore::in_memory().unwrap()));
        let client = ApiClient::new("http://localhost:5000/", session).unwrap();
        assert_eq!(client.url("/goals"), "http://localhost:5000/api/goals");
    }
}
