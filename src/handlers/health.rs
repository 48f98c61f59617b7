use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::StorageBackend;
use crate::version::GIT_VERSION;

#[derive(Clone)]
pub struct HealthState {
    pub storage: StorageBackend,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    git_version: &'static str,
    storage: &'static str,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        git_version: GIT_VERSION,
        storage: state.storage.as_str(),
    })
}
