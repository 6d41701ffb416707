//! HTTP error responses for the license endpoints.
//!
//! Both endpoints report failures with a human-readable `message` and a stable
//! machine-readable `code`. The verify endpoint additionally carries
//! `valid: false`:
//!
//! ```json
//! { "valid": false, "code": "LICENSE_EXPIRED", "message": "License has expired" }
//! ```
//!
//! Business-rule and validation failures are answered with 400, storage and
//! configuration failures with 500 and a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::LicenseError;

/// Message returned for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Machine-readable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request payload is missing fields or malformed
    InvalidRequest,
    /// License key was not found
    LicenseNotFound,
    /// License was deactivated by the operator
    LicenseInactive,
    /// License has expired
    LicenseExpired,
    /// License is bound to different hardware
    HardwareMismatch,
    /// License key is already taken
    AlreadyExists,
    /// Unexpected internal server error
    InternalError,
}

impl ErrorCode {
    /// Returns the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<&LicenseError> for ErrorCode {
    fn from(err: &LicenseError) -> Self {
        match err {
            LicenseError::Validation(_) => ErrorCode::InvalidRequest,
            LicenseError::NotFound => ErrorCode::LicenseNotFound,
            LicenseError::Deactivated => ErrorCode::LicenseInactive,
            LicenseError::Expired => ErrorCode::LicenseExpired,
            LicenseError::HwidMismatch => ErrorCode::HardwareMismatch,
            LicenseError::DuplicateKey => ErrorCode::AlreadyExists,
            LicenseError::Persistence(_) | LicenseError::Server(_) | LicenseError::Config(_) => {
                ErrorCode::InternalError
            }
        }
    }
}

/// Message safe to show the caller. Server faults are logged and masked.
fn public_message(err: &LicenseError) -> String {
    if err.is_client_error() {
        err.to_string()
    } else {
        error!("Request failed: {err}");
        INTERNAL_ERROR_MESSAGE.to_string()
    }
}

/// Body of a failed verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyErrorBody {
    pub valid: bool,
    pub code: ErrorCode,
    pub message: String,
}

/// Body of a failed creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Error returned by the verify endpoint.
#[derive(Debug)]
pub struct VerifyFailure(pub LicenseError);

impl From<LicenseError> for VerifyFailure {
    fn from(err: LicenseError) -> Self {
        VerifyFailure(err)
    }
}

impl IntoResponse for VerifyFailure {
    fn into_response(self) -> Response {
        let code = ErrorCode::from(&self.0);
        let body = VerifyErrorBody {
            valid: false,
            code,
            message: public_message(&self.0),
        };
        (code.status_code(), Json(body)).into_response()
    }
}

/// Error returned by the create endpoint.
#[derive(Debug)]
pub struct CreateFailure(pub LicenseError);

impl From<LicenseError> for CreateFailure {
    fn from(err: LicenseError) -> Self {
        CreateFailure(err)
    }
}

impl IntoResponse for CreateFailure {
    fn into_response(self) -> Response {
        let code = ErrorCode::from(&self.0);
        let body = CreateErrorBody {
            code,
            message: public_message(&self.0),
        };
        (code.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(
            ErrorCode::from(&LicenseError::Expired).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::from(&LicenseError::DuplicateKey).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::from(&LicenseError::Persistence("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::HardwareMismatch).unwrap();
        assert_eq!(json, "\"HARDWARE_MISMATCH\"");
    }

    #[test]
    fn persistence_detail_is_not_leaked() {
        let err = LicenseError::Persistence("UNIQUE constraint on secret_table".into());
        assert_eq!(public_message(&err), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn verify_failure_status() {
        let response = VerifyFailure(LicenseError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = CreateFailure(LicenseError::Persistence("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
