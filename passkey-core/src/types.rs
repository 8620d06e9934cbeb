//! Ceremony request/response types
//!
//! Authenticator responses arrive as JSON produced by the browser's
//! `PublicKeyCredential.toJSON()`. Every binary field is base64url text and is
//! only decoded inside the verification engine.

use serde::{Deserialize, Serialize};

/// `PublicKeyCredential` returned by `navigator.credentials.create()`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCredential {
    /// base64url credential ID
    pub id: String,
    /// Same bytes as `id`
    pub raw_id: String,
    /// Always `public-key`
    #[serde(rename = "type")]
    pub type_: String,
    pub response: AttestationResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub client_extension_results: Option<serde_json::Value>,
}

/// `AuthenticatorAttestationResponse`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<String>,
}

/// `PublicKeyCredential` returned by `navigator.credentials.get()`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationCredential {
    /// base64url credential ID, the lookup key
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub response: AssertionResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub client_extension_results: Option<serde_json::Value>,
}

/// `AuthenticatorAssertionResponse`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    /// Ignored: lookup is by credential ID only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

/// Body of the registration verify call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegistrationRequest {
    pub attestation: Option<RegistrationCredential>,
    /// Challenge echoed from the registration options
    pub challenge: Option<String>,
}

/// Body of the authentication verify call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthenticationRequest {
    pub assertion: Option<AuthenticationCredential>,
    /// Challenge echoed from the authentication options
    pub challenge: Option<String>,
}

/// Body of the authentication options call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptionsRequest {
    /// Restrict the ceremony to this credential if it is registered
    #[serde(default)]
    pub credential_id_hint: Option<String>,
}

/// Successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub ok: bool,
    pub credential_id: String,
}

/// Successful authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOutcome {
    pub ok: bool,
    pub credential_id: String,
    /// Counter reported by the authenticator (not necessarily the stored value)
    pub new_counter: u32,
}
