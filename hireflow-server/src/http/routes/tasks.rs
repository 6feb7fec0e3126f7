//! Task endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use super::candidates::CreatedResponse;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{NewTask, Task, TaskFilter};
use crate::services::TaskService;

/// POST /tasks/list - body is an optional filter
async fn list(
    State(state): State<Arc<AppState>>,
    filter: Option<Json<TaskFilter>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let filter = filter.map(|Json(f)| f).unwrap_or_default();
    let tasks = TaskService::new(&state.db).list(filter).await?;
    Ok(Json(tasks))
}

/// POST /tasks/create
async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTask>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = TaskService::new(&state.db).create(req).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Task routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", post(list))
        .route("/create", post(create))
}
