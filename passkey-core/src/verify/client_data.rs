use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{PasskeyError, Result};

/// Which ceremony produced the client data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CeremonyType {
    Create,
    Get,
}

impl CeremonyType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "webauthn.create",
            Self::Get => "webauthn.get",
        }
    }
}

/// `CollectedClientData` as serialized by the browser
#[derive(Debug, Deserialize)]
pub(crate) struct CollectedClientData {
    #[serde(rename = "type")]
    pub type_: String,
    pub challenge: String,
    pub origin: String,
    #[serde(default, rename = "crossOrigin")]
    pub cross_origin: Option<bool>,
}

/// Parse clientDataJSON and check it was produced for this ceremony,
/// challenge and origin. Returns SHA-256(clientDataJSON), the value the
/// authenticator signed over.
pub(crate) fn verify_client_data(
    raw: &[u8],
    ceremony: CeremonyType,
    expected_challenge: &str,
    expected_origin: &str,
) -> Result<[u8; 32]> {
    let client_data: CollectedClientData = serde_json::from_slice(raw)
        .map_err(|e| PasskeyError::verification(format!("clientDataJSON unreadable: {e}")))?;

    if client_data.type_ != ceremony.as_str() {
        return Err(PasskeyError::verification(format!(
            "unexpected client data type {}",
            client_data.type_
        )));
    }
    if client_data.challenge != expected_challenge {
        return Err(PasskeyError::verification("challenge mismatch"));
    }
    if client_data.origin != expected_origin {
        return Err(PasskeyError::verification(format!(
            "unexpected origin {}",
            client_data.origin
        )));
    }
    // Cross-origin iframes are not an allowed embedding
    if client_data.cross_origin == Some(true) {
        return Err(PasskeyError::verification("cross-origin ceremony"));
    }

    Ok(Sha256::digest(raw).into())
}
