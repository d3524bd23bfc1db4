//! Shared error payload and interface-boundary mapping for all routes.

use axum::http::StatusCode;
use axum::Json;
use careline_agent::PipelineError;
use careline_core::errors::{ApplicationError, InterfaceError};
use careline_db::repositories::RepositoryError;
use serde::Serialize;
use uuid::Uuid;

/// Error body returned by every route. `error` is always a user-safe
/// message; the correlation id links it to server-side logs.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn interface_error_response(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = ApiError {
        error: error.user_message().to_string(),
        correlation_id: error.correlation_id().to_string(),
    };
    (status, Json(body))
}

pub fn repository_error_response(
    error: RepositoryError,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    interface_error_response(application_error(error).into_interface(correlation_id))
}

pub fn pipeline_error_response(
    error: PipelineError,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    let application_error = match error {
        PipelineError::Repository(repository_error) => application_error(repository_error),
        PipelineError::Crypto(crypto_error) => {
            ApplicationError::Configuration(crypto_error.to_string())
        }
    };
    interface_error_response(application_error.into_interface(correlation_id))
}

fn application_error(error: RepositoryError) -> ApplicationError {
    if error.is_unique_violation() {
        ApplicationError::Validation(error.to_string())
    } else {
        ApplicationError::Persistence(error.to_string())
    }
}
