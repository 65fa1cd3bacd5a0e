use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::LogError;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Maps engine errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub LogError);

impl From<LogError> for ApiError {
    fn from(err: LogError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self.0 {
            LogError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", self.0.to_string()),
            LogError::ReferentialViolation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "referential_violation",
                self.0.to_string(),
            ),
            LogError::DuplicateId { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "duplicate_id",
                self.0.to_string(),
            ),
            LogError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}
