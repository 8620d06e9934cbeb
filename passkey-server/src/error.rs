//! API error handling module
//!
//! Every failure leaves the server as `{"error": {"code", "message"}}` with a
//! fixed message per code. Internal details only go to the logs.

use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use passkey_core::PasskeyError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be read as the expected JSON shape
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// Request body exceeded the configured limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Error from a ceremony operation
    #[error(transparent)]
    Passkey(#[from] PasskeyError),
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Stable code, e.g. `VERIFICATION_FAILED`
    pub code: &'static str,
    pub message: &'static str,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Passkey(e) => match e {
                PasskeyError::InvalidRequest(_) | PasskeyError::VerificationFailed(_) => {
                    StatusCode::BAD_REQUEST
                }
                PasskeyError::CredentialNotFound(_) => StatusCode::NOT_FOUND,
                PasskeyError::InvalidCounter { .. } => StatusCode::UNAUTHORIZED,
                PasskeyError::AlreadyExists(_) | PasskeyError::ConcurrentModification(_) => {
                    StatusCode::CONFLICT
                }
                PasskeyError::Configuration(_)
                | PasskeyError::Storage(_)
                | PasskeyError::Randomness(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedBody(_) => "INVALID_REQUEST",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Passkey(PasskeyError::Configuration(_)) => "INTERNAL_ERROR",
            Self::Passkey(e) => e.code(),
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> &'static str {
        match self {
            Self::MalformedBody(_) => {
                PasskeyError::InvalidRequest(String::new()).client_message()
            }
            Self::PayloadTooLarge => "Request body exceeds the size limit",
            Self::Passkey(PasskeyError::Configuration(_)) => {
                PasskeyError::Storage(String::new()).client_message()
            }
            Self::Passkey(e) => e.client_message(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::MalformedBody(_) | Self::PayloadTooLarge => "bad_request",
            Self::Passkey(e) => match e {
                PasskeyError::InvalidRequest(_) => "bad_request",
                PasskeyError::VerificationFailed(_) => "verification",
                PasskeyError::CredentialNotFound(_) => "not_found",
                PasskeyError::InvalidCounter { .. } => "security",
                PasskeyError::AlreadyExists(_) | PasskeyError::ConcurrentModification(_) => {
                    "conflict"
                }
                PasskeyError::Configuration(_)
                | PasskeyError::Storage(_)
                | PasskeyError::Randomness(_) => "internal",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();

        // Log based on severity, always including internal details
        if status.is_server_error() || category == "security" {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.client_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
