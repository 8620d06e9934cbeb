use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Errors surfaced by the ceremony operations.
///
/// The `String` payloads carry internal detail for logs. Callers exposing
/// these errors to clients should use [`PasskeyError::code`] and
/// [`PasskeyError::client_message`] instead of `Display`.
#[derive(Error, Debug)]
pub enum PasskeyError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    #[error("Counter did not increase: stored={stored}, received={received}")]
    InvalidCounter { stored: u32, received: u32 },

    #[error("Credential already exists: {0}")]
    AlreadyExists(String),

    #[error("Concurrent modification of credential {0}")]
    ConcurrentModification(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Randomness source failed: {0}")]
    Randomness(String),
}

impl PasskeyError {
    pub(crate) fn verification(detail: impl Into<String>) -> Self {
        Self::VerificationFailed(detail.into())
    }

    pub(crate) fn invalid_request(detail: impl Into<String>) -> Self {
        Self::InvalidRequest(detail.into())
    }

    /// Stable error code for programmatic handling by clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::VerificationFailed(_) => "VERIFICATION_FAILED",
            Self::CredentialNotFound(_) => "CREDENTIAL_NOT_FOUND",
            Self::InvalidCounter { .. } => "INVALID_COUNTER",
            Self::AlreadyExists(_) => "CREDENTIAL_EXISTS",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Storage(_) | Self::Randomness(_) => "INTERNAL_ERROR",
        }
    }

    /// Sanitized message, never reveals which verification check failed
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "The request is missing required fields or is malformed",
            Self::VerificationFailed(_) => "Failed to verify the authenticator response",
            Self::CredentialNotFound(_) => "No credential found with the provided ID",
            Self::InvalidCounter { .. } => {
                "Authentication counter did not increase - possible cloned authenticator"
            }
            Self::AlreadyExists(_) => "A credential with this ID is already registered",
            Self::ConcurrentModification(_) => {
                "The credential was modified concurrently, please retry"
            }
            Self::Configuration(_) => "Server is misconfigured",
            Self::Storage(_) | Self::Randomness(_) => "An internal server error occurred",
        }
    }

    /// Whether a caller may retry the same operation with fresh state
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl From<StoreError> for PasskeyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(id) => Self::AlreadyExists(id),
            StoreError::ConcurrentModification(id) => Self::ConcurrentModification(id),
            other => Self::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PasskeyError>;
