//! Error types for chopd-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chopd_common::quota::{AdmissionDenial, DenialReason};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Admission refused by the quota ledger (400/413/429)
    #[error(transparent)]
    Admission(#[from] AdmissionDenial),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// chopd-common error
    #[error("Common error: {0}")]
    Common(#[from] chopd_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            // Admission denials carry the upgrade hint so the client can
            // offer the upgrade path inline
            ApiError::Admission(denial) => {
                let status = match denial.reason {
                    DenialReason::TooFewImages | DenialReason::TooManyImages => {
                        StatusCode::BAD_REQUEST
                    }
                    DenialReason::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
                    DenialReason::QuotaExhausted => StatusCode::TOO_MANY_REQUESTS,
                };
                let body = Json(json!({
                    "error": {
                        "code": denial.reason.code(),
                        "message": denial.message,
                        "upgradeRequired": denial.upgrade_required,
                    }
                }));
                return (status, body).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
