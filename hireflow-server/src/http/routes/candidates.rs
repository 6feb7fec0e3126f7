//! Candidate endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{Candidate, CandidateDetails, NewCandidate};
use crate::services::{ApplyOutcome, CandidateService};

/// Get candidate request
#[derive(Deserialize)]
pub struct GetCandidateRequest {
    pub id: Uuid,
}

/// Apply candidate request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub candidate_id: Uuid,
    pub dashboard_id: Uuid,
}

/// Created resource id
#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// POST /candidates/list
async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Candidate>>, ApiError> {
    let candidates = CandidateService::new(&state.db).list().await?;
    Ok(Json(candidates))
}

/// POST /candidates/get
async fn get_candidate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetCandidateRequest>,
) -> Result<Json<CandidateDetails>, ApiError> {
    let candidate = CandidateService::new(&state.db).by_id(req.id).await?;
    Ok(Json(candidate))
}

/// POST /candidates/create
async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewCandidate>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let candidate = req.validate()?;
    let id = CandidateService::new(&state.db).create(candidate).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST /candidates/in-process/list
async fn in_process(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Candidate>>, ApiError> {
    let candidates = CandidateService::new(&state.db).in_process().await?;
    Ok(Json(candidates))
}

/// POST /candidates/apply
async fn apply(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplyOutcome>), ApiError> {
    let outcome = CandidateService::new(&state.db)
        .apply(req.candidate_id, req.dashboard_id)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Candidate routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", post(list))
        .route("/get", post(get_candidate))
        .route("/create", post(create))
        .route("/in-process/list", post(in_process))
        .route("/apply", post(apply))
}
