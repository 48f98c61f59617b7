//! JSON API over the authenticated user's workouts.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{CreateWorkout, Workout};
use crate::store::WorkoutStore;

#[derive(Clone)]
pub struct WorkoutsState {
    pub store: Arc<dyn WorkoutStore>,
}

pub async fn list(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Workout>>> {
    let workouts = state.store.list_all(auth_user.owner()).await?;
    Ok(Json(workouts))
}

pub async fn create(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    payload: std::result::Result<Json<CreateWorkout>, JsonRejection>,
) -> Result<(StatusCode, Json<Workout>)> {
    let Json(body) = payload?;
    let new = body.validate()?;

    let workout = state.store.add(auth_user.owner(), new).await?;
    tracing::debug!(user_id = auth_user.id, workout_id = workout.id, "Added workout");

    Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn session_workouts(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<Workout>>> {
    let Path(session_title) = path?;
    let workouts = state
        .store
        .list(auth_user.owner(), &session_title)
        .await?;
    Ok(Json(workouts))
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(id) = path?;
    if !state.store.delete_by_id(auth_user.owner(), id).await? {
        return Err(AppError::NotFound("Workout not found".to_string()));
    }

    Ok(Json(json!({ "message": "Workout deleted successfully" })))
}

pub async fn delete_session(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(session_title) = path?;
    if !state
        .store
        .delete_session(auth_user.owner(), &session_title)
        .await?
    {
        return Err(AppError::NotFound("Session not found".to_string()));
    }

    Ok(Json(json!({ "message": "Session deleted successfully" })))
}
