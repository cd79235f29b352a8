//! Owner-scoped goal CRUD

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use studytimer_api::{Goal, GoalUpdate, MessageResponse, NewGoal};
use studytimer_store::{AuditEvent, AuditEventType};
use studytimer_util::{GoalId, UserId};
use tracing::info;

use crate::{ApiError, ApiResult, AppState, AuthUser};

/// Load a goal and check that `user` owns it
fn owned_goal(state: &AppState, id: &GoalId, user: &UserId) -> ApiResult<Goal> {
    let goal = state
        .store
        .get_goal(id)?
        .ok_or_else(|| ApiError::NotFound("Goal not found".into()))?;
    if &goal.user != user {
        return Err(ApiError::Unauthorized("Not authorized".into()));
    }
    Ok(goal)
}

pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Goal>>> {
    Ok(Json(state.store.list_goals(&user)?))
}

pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<NewGoal>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let valid = body.validate()?;
    let goal = state.store.create_goal(&user, &valid)?;

    let _ = state
        .store
        .append_audit(AuditEvent::new(AuditEventType::GoalCreated {
            goal_id: goal.id.clone(),
            owner: user,
        }));
    info!(goal_id = %goal.id, goal_time = %goal.goal_time, "Goal created");

    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<GoalId>,
) -> ApiResult<Json<Goal>> {
    Ok(Json(owned_goal(&state, &id, &user)?))
}

pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<GoalId>,
    Json(body): Json<GoalUpdate>,
) -> ApiResult<Json<Goal>> {
    owned_goal(&state, &id, &user)?;
    let changes = body.validate()?;

    let goal = state
        .store
        .update_goal(&id, &changes)?
        .ok_or_else(|| ApiError::NotFound("Goal not found".into()))?;

    let _ = state
        .store
        .append_audit(AuditEvent::new(AuditEventType::GoalUpdated {
            goal_id: id,
            owner: user,
        }));

    Ok(Json(goal))
}

pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<GoalId>,
) -> ApiResult<Json<MessageResponse>> {
    owned_goal(&state, &id, &user)?;
    state.store.delete_goal(&id)?;

    let _ = state
        .store
        .append_audit(AuditEvent::new(AuditEventType::GoalDeleted {
            goal_id: id.clone(),
            owner: user,
        }));
    info!(goal_id = %id, "Goal deleted");

    Ok(Json(MessageResponse {
        message: "Goal removed".into(),
    }))
}
