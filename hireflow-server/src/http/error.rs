//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Database failures are classified by SQLSTATE: constraint violations are
//! the caller's fault and map to 409, malformed values to 400, everything
//! else is logged and answered with a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hireflow_db::{sqlstate, DbError};
use serde_json::json;

use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// The database rejected a value as malformed (400)
    BadInput { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique or foreign-key constraint violated (409)
    Conflict { message: String },

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::BadInput { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "bad_input",
                    "message": message
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            other => classify(other),
        }
    }
}

fn classify(e: DbError) -> ApiError {
    match e.sqlstate().as_deref() {
        Some(sqlstate::UNIQUE_VIOLATION) => ApiError::Conflict {
            message: "resource already exists".to_string(),
        },
        Some(sqlstate::FOREIGN_KEY_VIOLATION) => ApiError::Conflict {
            message: "referenced resource does not exist or is still in use".to_string(),
        },
        Some(sqlstate::INVALID_TEXT_REPRESENTATION) => ApiError::BadInput {
            message: "malformed value".to_string(),
        },
        Some(sqlstate::NOT_NULL_VIOLATION) => ApiError::BadInput {
            message: "required value missing".to_string(),
        },
        _ => ApiError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use hireflow_db::BuilderError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "name cannot be empty");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err: ApiError = DbError::not_found("candidate", "42").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "candidate '42' not found");
    }

    #[tokio::test]
    async fn builder_misuse_is_500_without_details() {
        let err: ApiError = DbError::from(BuilderError::EmptyTables).into();
        assert!(matches!(err, ApiError::Database(_)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn pool_errors_are_500() {
        let err: ApiError = DbError::Acquire(sqlx::Error::PoolTimedOut).into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn conflict_is_409() {
        let err = ApiError::Conflict {
            message: "resource already exists".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
