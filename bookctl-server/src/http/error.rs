//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Store failures are logged with their cause and answered generically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use bookctl_core::ValidationErrors;

use crate::db::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Field validation failed (422)
    Validation(ValidationErrors),

    /// Malformed request body or header (400)
    BadRequest { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Stale version on update (409)
    EditConflict { resource: &'static str, id: String },

    /// Store deadline elapsed (504, logged)
    Timeout { operation: &'static str },

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "validation_error",
                    "message": "one or more fields failed validation",
                    "fields": errors
                }),
            ),
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "bad_request",
                    "message": message
                }),
            ),
            Self::NotFound { resource, .. } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("the requested {} could not be found", resource)
                }),
            ),
            Self::EditConflict { resource, .. } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "edit_conflict",
                    "message": format!(
                        "unable to update the {} due to an edit conflict, please try again",
                        resource
                    )
                }),
            ),
            Self::Timeout { operation } => {
                tracing::error!(operation, "store deadline exceeded");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    json!({
                        "error": "timeout",
                        "message": "the server took too long to respond"
                    }),
                )
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "database error");
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

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::EditConflict { resource, id } => Self::EditConflict { resource, id },
            DbError::Timeout { operation, .. } => Self::Timeout { operation },
            _ => Self::Database(e),
        }
    }
}
