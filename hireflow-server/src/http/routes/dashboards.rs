//! Dashboard endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::candidates::CreatedResponse;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{Dashboard, DashboardDetails, HistoryEntry, NewDashboard, Process};
use crate::services::DashboardService;

/// Move task request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAppendRequest {
    pub column_id: Uuid,
    pub task_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRef {
    pub dashboard_id: Uuid,
}

#[derive(Deserialize)]
pub struct DepartmentRef {
    pub department: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub task_id: Uuid,
}

/// POST /dashboard/list
async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Dashboard>>, ApiError> {
    let dashboards = DashboardService::new(&state.db).list().await?;
    Ok(Json(dashboards))
}

/// POST /dashboard/create - dashboard plus its columns
async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewDashboard>,
) -> Result<(StatusCode, Json<DashboardDetails>), ApiError> {
    let dashboard = req.validate()?;
    let created = DashboardService::new(&state.db).create(dashboard).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /dashboard/by-department
async fn by_department(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DepartmentRef>,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = DashboardService::new(&state.db)
        .by_department(req.department)
        .await?;
    Ok(Json(dashboard))
}

/// POST /dashboard/processes
async fn processes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DashboardRef>,
) -> Result<Json<Vec<Process>>, ApiError> {
    let columns = DashboardService::new(&state.db)
        .processes(req.dashboard_id)
        .await?;
    Ok(Json(columns))
}

/// POST /dashboard/history-append
async fn history_append(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HistoryAppendRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = DashboardService::new(&state.db)
        .history_append(req.task_id, req.column_id)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST /dashboard/history
async fn history(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskRef>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let entries = DashboardService::new(&state.db).history(req.task_id).await?;
    Ok(Json(entries))
}

/// Dashboard routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", post(list))
        .route("/create", post(create))
        .route("/by-department", post(by_department))
        .route("/processes", post(processes))
        .route("/history-append", post(history_append))
        .route("/history", post(history))
}
