//! Registration ceremony handlers

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use passkey_core::{RegistrationOptions, RegistrationOutcome, RegistrationRequest};

use crate::challenges::CeremonyKind;
use crate::error::{ApiResult, ErrorResponse};
use crate::state::AppState;

/// POST /webauthn/registration/options - Start a usernameless registration
///
/// Any request body is ignored.
#[utoipa::path(
    post,
    path = "/webauthn/registration/options",
    tag = "Registration",
    responses(
        (status = 200, description = "Options for navigator.credentials.create()", body = RegistrationOptions),
        (status = 500, description = "Challenge generation failed", body = ErrorResponse)
    )
)]
pub async fn registration_options(
    State(state): State<AppState>,
) -> ApiResult<Json<RegistrationOptions>> {
    let options = state.ceremony.registration_options()?;

    if let Some(registry) = &state.challenges {
        registry.issue(&options.challenge, CeremonyKind::Registration);
    }

    Ok(Json(options))
}

/// POST /webauthn/registration/verify - Verify an attestation and store the credential
#[utoipa::path(
    post,
    path = "/webauthn/registration/verify",
    tag = "Registration",
    request_body = RegistrationRequest,
    responses(
        (status = 200, description = "Credential registered", body = RegistrationOutcome),
        (status = 400, description = "Malformed request or verification failed", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 409, description = "Credential already registered", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn registration_verify(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> ApiResult<Json<RegistrationOutcome>> {
    let Json(request) = payload?;

    if let (Some(registry), Some(challenge)) = (&state.challenges, &request.challenge) {
        registry.consume(challenge, CeremonyKind::Registration)?;
    }

    let outcome = state.ceremony.register(request).await?;
    Ok(Json(outcome))
}
