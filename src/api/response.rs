use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::service::ServiceError;

/// Response from a successful batch import.
#[derive(Debug, Serialize)]
pub struct BatchImportResponse {
    pub message: String,
    pub imported: usize,
}

impl BatchImportResponse {
    pub fn new(imported: usize) -> Self {
        BatchImportResponse {
            message: format!("Batch import successful. Imported {imported} records."),
            imported,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub database: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "BAD_REQUEST")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "INTERNAL_ERROR")
    }
}

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Service call failed
    Service(ServiceError),

    /// Request could not be decoded
    BadRequest(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message))
            }
            ApiError::Service(ServiceError::Validation(e)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(e.reason(), "VALIDATION_ERROR"),
            ),
            // Update of a missing record is a server error, unlike GET/DELETE
            ApiError::Service(err @ ServiceError::NotFound(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(err.to_string(), "NOT_FOUND"),
            ),
            ApiError::Service(ServiceError::Store(e)) => {
                error!(error = %e, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(e.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
