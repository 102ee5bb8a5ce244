//! Task polling routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use worldforge_core::error::DomainError;
use worldforge_tasks::domain::task::Task;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /cleanup.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    /// Terminal tasks dropped.
    pub removed: usize,
}

/// GET /
async fn list_running(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.queue.list_running())
}

/// GET /{task_id}
async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    state
        .queue
        .get(task_id.into())
        .map(Json)
        .ok_or_else(|| DomainError::not_found("task", task_id).into())
}

/// POST /cleanup
async fn cleanup(State(state): State<AppState>) -> Json<CleanupResponse> {
    let removed = state.queue.cleanup(state.task_retention);
    info!(removed, retained = state.task_retention, "task cleanup");
    Json(CleanupResponse { removed })
}

/// Returns the router for task polling.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_running))
        .route("/cleanup", post(cleanup))
        .route("/{task_id}", get(get_task))
}
