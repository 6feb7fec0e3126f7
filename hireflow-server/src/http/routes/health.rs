//! Health check endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Database health response
#[derive(Serialize)]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub database: String,
    /// Connections currently leased out of the pool
    pub leases: u32,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health/db - round trip to the database
async fn database(State(state): State<Arc<AppState>>) -> Result<Json<DatabaseHealth>, ApiError> {
    state.db.execute_raw("SELECT 1").await?;
    Ok(Json(DatabaseHealth {
        status: "ok",
        database: state.db.config().database.clone(),
        leases: state.db.leases(),
    }))
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(database))
}
