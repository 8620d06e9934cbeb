//! Ceremony options handed to `navigator.credentials.create()` / `.get()`
//!
//! Generation is pure apart from randomness: nothing is persisted, the caller
//! round-trips the challenge.

use serde::{Deserialize, Serialize};

use crate::config::RelyingParty;
use crate::credential::Credential;
use crate::encoding::random_b64url;
use crate::error::Result;
use crate::verify::SUPPORTED_ALGORITHMS;

/// Ceremony timeout advertised to the client, in milliseconds
pub const CEREMONY_TIMEOUT_MS: u64 = 60_000;

const PLACEHOLDER_USER_NAME: &str = "user";
const PLACEHOLDER_DISPLAY_NAME: &str = "User";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    Required,
    Preferred,
    Discouraged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ResidentKey {
    Required,
    Preferred,
    Discouraged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyance {
    None,
    Indirect,
    Direct,
    Enterprise,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RpEntity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Random base64url handle, never used for lookup
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub type_: String,
    pub alg: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    /// `platform` / `cross-platform`; omitted to allow either
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    pub resident_key: ResidentKey,
    pub require_resident_key: bool,
    pub user_verification: UserVerification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CredentialDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

/// `PublicKeyCredentialCreationOptions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub rp: RpEntity,
    pub user: UserEntity,
    pub challenge: String,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    pub timeout: u64,
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub authenticator_selection: AuthenticatorSelection,
    pub attestation: AttestationConveyance,
}

/// `PublicKeyCredentialRequestOptions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub challenge: String,
    pub timeout: u64,
    pub rp_id: String,
    /// Omitted when any discoverable credential may answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<Vec<CredentialDescriptor>>,
    pub user_verification: UserVerification,
}

/// Options for a usernameless registration
pub fn registration_options(rp: &RelyingParty) -> Result<RegistrationOptions> {
    Ok(RegistrationOptions {
        rp: RpEntity {
            id: rp.id().to_string(),
            name: rp.name().to_string(),
        },
        user: UserEntity {
            id: random_b64url()?,
            name: PLACEHOLDER_USER_NAME.to_string(),
            display_name: PLACEHOLDER_DISPLAY_NAME.to_string(),
        },
        challenge: random_b64url()?,
        pub_key_cred_params: SUPPORTED_ALGORITHMS
            .iter()
            .map(|&alg| PubKeyCredParam {
                type_: "public-key".to_string(),
                alg,
            })
            .collect(),
        timeout: CEREMONY_TIMEOUT_MS,
        exclude_credentials: Vec::new(),
        authenticator_selection: AuthenticatorSelection {
            authenticator_attachment: None,
            resident_key: ResidentKey::Preferred,
            require_resident_key: false,
            user_verification: UserVerification::Preferred,
        },
        attestation: AttestationConveyance::None,
    })
}

/// Options for an authentication ceremony
///
/// `hinted` is the already-resolved hint credential, if any; it restricts
/// the ceremony to that single credential.
pub fn authentication_options(
    rp: &RelyingParty,
    hinted: Option<&Credential>,
) -> Result<AuthenticationOptions> {
    Ok(AuthenticationOptions {
        challenge: random_b64url()?,
        timeout: CEREMONY_TIMEOUT_MS,
        rp_id: rp.id().to_string(),
        allow_credentials: hinted.map(|credential| {
            vec![CredentialDescriptor {
                id: credential.credential_id.clone(),
                type_: "public-key".to_string(),
                transports: credential.transports.clone(),
            }]
        }),
        user_verification: UserVerification::Preferred,
    })
}
