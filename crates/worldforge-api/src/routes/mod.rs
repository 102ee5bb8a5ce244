//! Route modules.

pub mod health;
pub mod tasks;
pub mod worlds;

use axum::Router;

use crate::state::AppState;

/// The full route tree, without middleware layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/worlds", worlds::router())
        .nest("/api/v1/tasks", tasks::router())
        .with_state(state)
}

/// Response body for accepted generation requests.
#[derive(Debug, serde::Serialize)]
pub struct TaskAccepted {
    /// ID to poll at `GET /api/v1/tasks/{task_id}`.
    pub task_id: worldforge_tasks::domain::task::TaskId,
}
