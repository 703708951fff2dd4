//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_kernel::PortError;
use domain_payables::PayablesError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation { message: String, details: Vec<String> },

    #[error(transparent)]
    Payables(#[from] PayablesError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    /// HTTP status and machine-readable error kind
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Payables(e) => (payables_status(e), e.kind()),
        }
    }
}

fn payables_status(error: &PayablesError) -> StatusCode {
    match error {
        PayablesError::NotFound { .. } => StatusCode::NOT_FOUND,
        PayablesError::DataIntegrity { .. } | PayablesError::Money(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PayablesError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PayablesError::AllocationConflict { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PayablesError::Validation(_) => StatusCode::BAD_REQUEST,
        PayablesError::Port(port) => match port {
            _ if port.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            PortError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortError::Validation { .. } => StatusCode::BAD_REQUEST,
            PortError::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_kind();
        if status.is_server_error() {
            error!(error = %self, kind = error_type, "Request failed");
        }

        let details = match &self {
            ApiError::Validation { details, .. } => Some(details.clone()),
            ApiError::Payables(PayablesError::DataIntegrity { document_id, .. }) => {
                Some(vec![document_id.clone()])
            }
            _ => None,
        };

        let message = match &self {
            ApiError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::Validation {
            message: "Request failed validation".to_string(),
            details,
        }
    }
}
