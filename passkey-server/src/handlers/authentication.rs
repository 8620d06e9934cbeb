//! Authentication ceremony handlers

use axum::{
    body::Bytes,
    extract::rejection::{BytesRejection, JsonRejection},
    extract::State,
    Json,
};
use passkey_core::{
    AuthenticationOptions, AuthenticationOptionsRequest, AuthenticationOutcome,
    AuthenticationRequest,
};

use crate::challenges::CeremonyKind;
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::state::AppState;

/// POST /webauthn/authentication/options - Start an authentication ceremony
///
/// The body is optional. A `credentialIdHint` naming a registered credential
/// restricts the ceremony to it; an unknown hint is not an error.
#[utoipa::path(
    post,
    path = "/webauthn/authentication/options",
    tag = "Authentication",
    request_body(content = AuthenticationOptionsRequest, description = "Optional credential hint"),
    responses(
        (status = 200, description = "Options for navigator.credentials.get()", body = AuthenticationOptions),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse)
    )
)]
pub async fn authentication_options(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<AuthenticationOptions>> {
    let request = parse_optional_body(&body?)?;

    let options = state
        .ceremony
        .authentication_options(request.credential_id_hint.as_deref())
        .await?;

    if let Some(registry) = &state.challenges {
        registry.issue(&options.challenge, CeremonyKind::Authentication);
    }

    Ok(Json(options))
}

/// POST /webauthn/authentication/verify - Verify an assertion
#[utoipa::path(
    post,
    path = "/webauthn/authentication/verify",
    tag = "Authentication",
    request_body = AuthenticationRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthenticationOutcome),
        (status = 400, description = "Malformed request or verification failed", body = ErrorResponse),
        (status = 401, description = "Signature counter did not increase", body = ErrorResponse),
        (status = 404, description = "Unknown credential", body = ErrorResponse),
        (status = 409, description = "Concurrent counter update, retry", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn authentication_verify(
    State(state): State<AppState>,
    payload: Result<Json<AuthenticationRequest>, JsonRejection>,
) -> ApiResult<Json<AuthenticationOutcome>> {
    let Json(request) = payload?;

    if let (Some(registry), Some(challenge)) = (&state.challenges, &request.challenge) {
        registry.consume(challenge, CeremonyKind::Authentication)?;
    }

    let outcome = state.ceremony.authenticate(request).await?;
    Ok(Json(outcome))
}

fn parse_optional_body(body: &[u8]) -> Result<AuthenticationOptionsRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AuthenticationOptionsRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}
