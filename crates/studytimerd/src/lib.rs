//! studytimerd - the studytimer REST service
//!
//! Routes, all under `/api`:
//! - `POST /auth/register`, `POST /auth/login`
//! - `GET|POST /goals`, `GET|PUT|DELETE /goals/{id}` (bearer token required)
//! - `GET /health`

mod accounts;
mod auth;
mod error;
mod goals;

pub use auth::{AuthUser, TokenManager, require_auth};
pub use error::{ApiError, ApiResult};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use studytimer_api::{API_VERSION, HealthStatus};
use studytimer_store::Store;
use studytimer_util::RateLimiter;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Shared service state
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenManager,
    /// Login attempts, keyed by normalized email
    pub login_limiter: Mutex<RateLimiter<String>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenManager, login_attempts_per_minute: u32) -> Self {
        Self {
            store,
            tokens,
            login_limiter: Mutex::new(RateLimiter::new(
                login_attempts_per_minute,
                Duration::from_secs(60),
            )),
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        live: true,
        store_ok: state.store.is_healthy(),
        api_version: API_VERSION,
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Build the full HTTP application
pub fn app_router(state: Arc<AppState>, cors_allow_origins: &[String]) -> Router {
    let protected = Router::new()
        .route("/goals", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/goals/{id}",
            get(goals::get_goal)
                .put(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .route("/auth/register", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/health", get(health))
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors_layer(cors_allow_origins))
        .layer(TraceLayer::new_for_http())
}
