//! API error handling
//!
//! Domain errors are mapped to status codes here and nowhere else.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_partner::{CreationError, StorageError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    /// Request fields that were missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<&'static str>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, required) = match self {
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                "missing_fields",
                format!("Fields {} are required", fields.join(", ")),
                Some(fields),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: error_type.to_string(),
            message,
            required,
        };

        (status, Json(body)).into_response()
    }
}

/// Request field name for a draft field
fn wire_name(field: &'static str) -> &'static str {
    match field {
        "code" => "value",
        "tax_id" => "taxId",
        "group_id" => "groupId",
        other => other,
    }
}

impl From<CreationError> for ApiError {
    fn from(err: CreationError) -> Self {
        match err {
            CreationError::MissingField { fields } => {
                ApiError::MissingFields(fields.into_iter().map(wire_name).collect())
            }
            CreationError::InvalidTaxId { message, .. } => ApiError::BadRequest(message),
            CreationError::InvalidGroup { group_id } => ApiError::BadRequest(format!(
                "Partner group {} is not valid for this tenant",
                group_id.value()
            )),
            CreationError::DuplicateCode { code } => ApiError::Conflict(format!(
                "Partner code (value) '{}' already exists, choose a different code",
                code
            )),
            e @ (CreationError::AllocationContention { .. }
            | CreationError::IdRangeExhausted { .. }) => ApiError::Unavailable(e.to_string()),
            CreationError::Persistence(detail) => {
                error!(detail = %detail, "Partner creation failed in storage");
                ApiError::Internal("Failed to create business partner".to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        error!(error = %err, "Partner storage query failed");
        if err.is_transient() {
            ApiError::Unavailable("Storage is temporarily unavailable".to_string())
        } else {
            ApiError::Internal("Failed to read business partners".to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
