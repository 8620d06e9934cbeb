//! base64url helpers and randomness
//!
//! WebAuthn carries every binary field as unpadded base64url. Some clients
//! still pad, so decoding accepts both.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{PasskeyError, Result};

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Number of random bytes in a challenge or user handle
pub const RANDOM_BYTES: usize = 32;

/// Encode bytes as unpadded base64url
pub fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a base64url field of an authenticator response
///
/// Decoding failures are verification failures: the payload is untrusted
/// input that cannot be a valid proof.
pub fn b64url_decode(field: &str, value: &str) -> Result<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(value)
        .map_err(|e| PasskeyError::verification(format!("{field} is not base64url: {e}")))
}

/// Fresh random value from the OS CSPRNG, base64url-encoded
pub fn random_b64url() -> Result<String> {
    let mut bytes = [0u8; RANDOM_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| PasskeyError::Randomness(e.to_string()))?;
    Ok(b64url_encode(&bytes))
}
