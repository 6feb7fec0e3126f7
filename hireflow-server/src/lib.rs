//! hireflow-server: HTTP API for the hiring pipeline
//!
//! Candidates, dashboards with their process columns, tasks and the
//! column-move history, served as JSON over axum on top of `hireflow-db`.
//! Also owns the migration registry the binary runs before serving.

pub mod config;
pub mod http;
pub mod migrations;
pub mod models;
pub mod services;

pub use config::{AppConfig, ConfigError, ServerConfig};
pub use http::{build_router, run_server, ApiError, AppState, ServerError};
pub use migrations::MIGRATIONS;
