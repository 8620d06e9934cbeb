//! Verification engine
//!
//! Pure checks over authenticator responses: nothing here touches the
//! credential store. Every failure is a [`PasskeyError::VerificationFailed`]
//! whose detail is meant for logs only.

mod attestation;
mod authenticator_data;
mod client_data;
mod cose;

pub use cose::{ALG_EDDSA, ALG_ES256, ALG_RS256, SUPPORTED_ALGORITHMS};

use sha2::{Digest, Sha256};

use crate::credential::DeviceType;
use crate::encoding::{b64url_decode, b64url_encode};
use crate::error::{PasskeyError, Result};
use crate::types::{AuthenticationCredential, RegistrationCredential};

use attestation::AttestationObject;
use authenticator_data::AuthenticatorData;
use client_data::{verify_client_data, CeremonyType};
use cose::CosePublicKey;

const PUBLIC_KEY_TYPE: &str = "public-key";

/// What the relying party expects a response to be bound to
#[derive(Debug, Clone, Copy)]
pub struct Expectations<'a> {
    pub challenge: &'a str,
    pub origin: &'a str,
    pub rp_id: &'a str,
}

/// A verified registration, ready to become a stored credential
#[derive(Debug, Clone)]
pub struct VerifiedRegistration {
    /// base64url credential ID
    pub credential_id: String,
    /// base64url COSE_Key bytes
    pub public_key: String,
    pub algorithm: i64,
    pub counter: u32,
    pub backed_up: bool,
    pub device_type: DeviceType,
    pub transports: Vec<String>,
    pub aaguid: [u8; 16],
    pub user_verified: bool,
    pub fmt: String,
}

/// A verified assertion
#[derive(Debug, Clone, Copy)]
pub struct VerifiedAuthentication {
    /// Signature counter reported by the authenticator
    pub new_counter: u32,
    pub user_verified: bool,
    pub backed_up: bool,
}

/// Verify a registration response against the expected challenge, origin and
/// RP ID. The response's own key verifies the attestation statement.
pub fn verify_registration(
    credential: &RegistrationCredential,
    expected: &Expectations<'_>,
) -> Result<VerifiedRegistration> {
    let raw_id = check_credential_id(&credential.type_, &credential.id, &credential.raw_id)?;

    let client_data_json =
        b64url_decode("clientDataJSON", &credential.response.client_data_json)?;
    let client_data_hash = verify_client_data(
        &client_data_json,
        CeremonyType::Create,
        expected.challenge,
        expected.origin,
    )?;

    let attestation_object =
        b64url_decode("attestationObject", &credential.response.attestation_object)?;
    let attestation = AttestationObject::parse(&attestation_object)?;
    let auth_data = AuthenticatorData::parse(&attestation.auth_data)?;
    check_rp_id_hash(&auth_data, expected.rp_id)?;
    auth_data.check_flags()?;

    let Some(attested) = auth_data.attested.as_ref() else {
        return Err(PasskeyError::verification("no attested credential data"));
    };
    if attested.credential_id != raw_id {
        return Err(PasskeyError::verification(
            "attested credential ID differs from rawId",
        ));
    }

    let key = CosePublicKey::from_cose(&attested.public_key)?;
    if !SUPPORTED_ALGORITHMS.contains(&key.algorithm()) {
        return Err(PasskeyError::verification(format!(
            "algorithm {} not accepted",
            key.algorithm()
        )));
    }
    attestation.verify_statement(&key, &client_data_hash)?;

    Ok(VerifiedRegistration {
        credential_id: b64url_encode(&raw_id),
        public_key: b64url_encode(&attested.public_key),
        algorithm: key.algorithm(),
        counter: auth_data.sign_count,
        backed_up: auth_data.backed_up(),
        device_type: DeviceType::from_backup_eligible(auth_data.backup_eligible()),
        transports: credential.response.transports.clone(),
        aaguid: attested.aaguid,
        user_verified: auth_data.user_verified(),
        fmt: attestation.fmt.clone(),
    })
}

/// Verify an assertion with the public key stored at registration
pub fn verify_authentication(
    credential: &AuthenticationCredential,
    expected: &Expectations<'_>,
    stored_public_key: &str,
) -> Result<VerifiedAuthentication> {
    check_credential_id(&credential.type_, &credential.id, &credential.raw_id)?;

    let client_data_json =
        b64url_decode("clientDataJSON", &credential.response.client_data_json)?;
    let client_data_hash = verify_client_data(
        &client_data_json,
        CeremonyType::Get,
        expected.challenge,
        expected.origin,
    )?;

    let authenticator_data =
        b64url_decode("authenticatorData", &credential.response.authenticator_data)?;
    let auth_data = AuthenticatorData::parse(&authenticator_data)?;
    check_rp_id_hash(&auth_data, expected.rp_id)?;
    auth_data.check_flags()?;

    let key_bytes = b64url_decode("storedPublicKey", stored_public_key)?;
    let key = CosePublicKey::from_cose(&key_bytes)?;
    let signature = b64url_decode("signature", &credential.response.signature)?;

    let mut signed = authenticator_data;
    signed.extend_from_slice(&client_data_hash);
    key.verify(&signed, &signature)?;

    Ok(VerifiedAuthentication {
        new_counter: auth_data.sign_count,
        user_verified: auth_data.user_verified(),
        backed_up: auth_data.backed_up(),
    })
}

/// Canonical (unpadded base64url) credential ID of an assertion
///
/// Checks `type`, and that `id` and `rawId` decode to the same bytes, so the
/// result is safe to use as a store key whatever encoding the client chose.
pub fn assertion_credential_id(credential: &AuthenticationCredential) -> Result<String> {
    check_credential_id(&credential.type_, &credential.id, &credential.raw_id)
        .map(|raw| b64url_encode(&raw))
}

/// `type` must be `public-key` and `id` must encode the same bytes as `rawId`
fn check_credential_id(type_: &str, id: &str, raw_id: &str) -> Result<Vec<u8>> {
    if type_ != PUBLIC_KEY_TYPE {
        return Err(PasskeyError::verification(format!(
            "unexpected credential type {type_}"
        )));
    }
    let raw = b64url_decode("rawId", raw_id)?;
    if raw.is_empty() || b64url_decode("id", id)? != raw {
        return Err(PasskeyError::verification("id does not match rawId"));
    }
    Ok(raw)
}

fn check_rp_id_hash(auth_data: &AuthenticatorData, rp_id: &str) -> Result<()> {
    let expected: [u8; 32] = Sha256::digest(rp_id.as_bytes()).into();
    if auth_data.rp_id_hash != expected {
        return Err(PasskeyError::verification("RP ID hash mismatch"));
    }
    Ok(())
}
