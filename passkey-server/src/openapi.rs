//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document for the passkey ceremony API.

use passkey_core::options::{
    AttestationConveyance, AuthenticatorSelection, CredentialDescriptor, PubKeyCredParam,
    ResidentKey, RpEntity, UserEntity, UserVerification,
};
use passkey_core::types::{AssertionResponse, AttestationResponse};
use passkey_core::{
    AuthenticationCredential, AuthenticationOptions, AuthenticationOptionsRequest,
    AuthenticationOutcome, AuthenticationRequest, RegistrationCredential, RegistrationOptions,
    RegistrationOutcome, RegistrationRequest,
};
use utoipa::OpenApi;

use crate::error::{ErrorDetail, ErrorResponse};
use crate::handlers::{HealthResponse, ReadyResponse};

/// Passkey relying party API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Passkey Relying Party API",
        version = "0.1.0",
        description = r#"
## Usernameless passkey registration and authentication

Each ceremony is two calls:

1. **Options** - returns a fresh challenge and parameters for
   `navigator.credentials.create()` or `navigator.credentials.get()`
2. **Verify** - submit the authenticator response together with the echoed
   challenge

Authentication enforces the signature counter: once a credential has reported
a non-zero counter, every assertion must report a strictly greater value.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Registration", description = "Create a passkey credential"),
        (name = "Authentication", description = "Sign in with a registered passkey"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::registration::registration_options,
        crate::handlers::registration::registration_verify,
        crate::handlers::authentication::authentication_options,
        crate::handlers::authentication::authentication_verify,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            ErrorResponse,
            ErrorDetail,
            RegistrationOptions,
            RpEntity,
            UserEntity,
            PubKeyCredParam,
            AuthenticatorSelection,
            ResidentKey,
            UserVerification,
            AttestationConveyance,
            CredentialDescriptor,
            AuthenticationOptions,
            AuthenticationOptionsRequest,
            RegistrationRequest,
            RegistrationCredential,
            AttestationResponse,
            RegistrationOutcome,
            AuthenticationRequest,
            AuthenticationCredential,
            AssertionResponse,
            AuthenticationOutcome,
        )
    )
)]
pub struct ApiDoc;
