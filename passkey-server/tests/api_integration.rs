//! API integration tests for passkey-server.
//!
//! These drive full registration and authentication ceremonies through the
//! HTTP router with a software authenticator.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use passkey_core::testing::SoftAuthenticator;
use passkey_core::{Ceremony, CredentialStore, MemoryCredentialStore, RelyingParty};
use passkey_server::{create_router, AppState, ChallengeRegistry, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

const RP_ID: &str = "example.com";
const ORIGIN: &str = "https://example.com";

fn relying_party() -> RelyingParty {
    RelyingParty::new(RP_ID, "Example", ORIGIN).unwrap()
}

/// Build the test router over a fresh in-memory store
fn create_test_app() -> (Router, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = AppState::new(Ceremony::new(relying_party(), store.clone()));
    (create_router(state, &Config::default()), store)
}

fn create_tracking_app() -> Router {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = AppState::new(Ceremony::new(relying_party(), store))
        .with_challenge_registry(Arc::new(ChallengeRegistry::new(Duration::from_secs(60))));
    create_router(state, &Config::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn register(app: &Router, device: &SoftAuthenticator) -> (StatusCode, Value) {
    let (status, options) = post_json(app, "/webauthn/registration/options", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let challenge = options["challenge"].as_str().unwrap().to_string();

    post_json(
        app,
        "/webauthn/registration/verify",
        json!({"attestation": device.register(&challenge), "challenge": challenge}),
    )
    .await
}

async fn authenticate(app: &Router, device: &SoftAuthenticator) -> (StatusCode, Value) {
    let (status, options) = post_json(
        app,
        "/webauthn/authentication/options",
        json!({"credentialIdHint": device.credential_id()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let challenge = options["challenge"].as_str().unwrap().to_string();

    post_json(
        app,
        "/webauthn/authentication/verify",
        json!({"assertion": device.authenticate(&challenge), "challenge": challenge}),
    )
    .await
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["storage"], "memory");
    assert_eq!(json["storage_reachable"], true);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        &app,
        Request::builder().uri("/ready").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/webauthn/registration/verify"].is_object());
    assert!(json["paths"]["/webauthn/authentication/options"].is_object());
}

// ============================================================================
// Options Tests
// ============================================================================

#[tokio::test]
async fn test_registration_options_shape() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/webauthn/registration/options")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rp"]["id"], RP_ID);
    assert_eq!(json["rp"]["name"], "Example");
    assert_eq!(json["attestation"], "none");
    assert_eq!(json["timeout"], 60000);
    assert_eq!(json["authenticatorSelection"]["residentKey"], "preferred");
    let algorithms: Vec<i64> = json["pubKeyCredParams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|param| param["alg"].as_i64().unwrap())
        .collect();
    assert_eq!(algorithms, vec![-8, -7, -257]);
    assert!(json["challenge"].as_str().unwrap().len() >= 22);
}

#[tokio::test]
async fn test_authentication_options_without_body() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/webauthn/authentication/options")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rpId"], RP_ID);
    assert_eq!(json["userVerification"], "preferred");
    assert!(json.get("allowCredentials").is_none());
}

#[tokio::test]
async fn test_unknown_hint_is_unrestricted() {
    let (app, _) = create_test_app();

    let (status, json) = post_json(
        &app,
        "/webauthn/authentication/options",
        json!({"credentialIdHint": "bm8tc3VjaC1jcmVkZW50aWFs"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.get("allowCredentials").is_none());
}

#[tokio::test]
async fn test_known_hint_restricts_allow_list() {
    let (app, _) = create_test_app();
    let device = SoftAuthenticator::es256(1, RP_ID, ORIGIN);
    register(&app, &device).await;

    let (status, json) = post_json(
        &app,
        "/webauthn/authentication/options",
        json!({"credentialIdHint": device.credential_id()}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["allowCredentials"],
        json!([{"id": device.credential_id(), "type": "public-key", "transports": ["internal", "hybrid"]}])
    );
}

// ============================================================================
// Ceremony Tests
// ============================================================================

#[tokio::test]
async fn test_register_then_authenticate_with_zero_counter() {
    let (app, store) = create_test_app();
    let mut device = SoftAuthenticator::es256(2, RP_ID, ORIGIN);

    let (status, json) = register(&app, &device).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"ok": true, "credentialId": device.credential_id()}));

    device.set_counter(5);
    let (status, json) = authenticate(&app, &device).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"ok": true, "credentialId": device.credential_id(), "newCounter": 5})
    );

    let stored = store.get(&device.credential_id()).await.unwrap().unwrap();
    assert_eq!(stored.counter, 0);
}

#[tokio::test]
async fn test_counter_replay_rejected() {
    let (app, store) = create_test_app();
    let mut device = SoftAuthenticator::ed25519(3, RP_ID, ORIGIN);
    device.set_counter(1);
    register(&app, &device).await;

    device.set_counter(2);
    let (status, _) = authenticate(&app, &device).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = authenticate(&app, &device).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "INVALID_COUNTER");

    let stored = store.get(&device.credential_id()).await.unwrap().unwrap();
    assert_eq!(stored.counter, 2);
}

#[tokio::test]
async fn test_rs256_credential_flow() {
    let (app, store) = create_test_app();
    let mut device = SoftAuthenticator::rs256(11, RP_ID, ORIGIN);
    device.set_counter(1);

    let (status, json) = register(&app, &device).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["credentialId"], device.credential_id());

    device.set_counter(2);
    let (status, json) = authenticate(&app, &device).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["newCounter"], 2);

    let stored = store.get(&device.credential_id()).await.unwrap().unwrap();
    assert_eq!(stored.counter, 2);
}

#[tokio::test]
async fn test_assertion_without_user_verification_rejected() {
    let (app, store) = create_test_app();
    let mut device = SoftAuthenticator::es256(12, RP_ID, ORIGIN);
    device.set_counter(1);
    register(&app, &device).await;

    device.set_user_verified(false);
    device.set_counter(2);
    let (status, json) = authenticate(&app, &device).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VERIFICATION_FAILED");

    let stored = store.get(&device.credential_id()).await.unwrap().unwrap();
    assert_eq!(stored.counter, 1);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _) = create_test_app();
    let device = SoftAuthenticator::es256(4, RP_ID, ORIGIN);

    let (status, _) = register(&app, &device).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = register(&app, &device).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "CREDENTIAL_EXISTS");
}

#[tokio::test]
async fn test_unknown_credential_not_found() {
    let (app, _) = create_test_app();
    let device = SoftAuthenticator::es256(5, RP_ID, ORIGIN);

    let (status, json) = authenticate(&app, &device).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "CREDENTIAL_NOT_FOUND");
}

#[tokio::test]
async fn test_challenge_mismatch_is_generic_failure() {
    let (app, store) = create_test_app();
    let device = SoftAuthenticator::es256(6, RP_ID, ORIGIN);

    let (status, json) = post_json(
        &app,
        "/webauthn/registration/verify",
        json!({"attestation": device.register("signed"), "challenge": "echoed"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VERIFICATION_FAILED");
    assert_eq!(
        json["error"]["message"],
        "Failed to verify the authenticator response"
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_wrong_origin_rejected() {
    let (app, _) = create_test_app();
    let device = SoftAuthenticator::es256(7, RP_ID, "https://phishing.example");

    let (status, json) = register(&app, &device).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VERIFICATION_FAILED");
}

// ============================================================================
// Malformed Request Tests
// ============================================================================

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (app, _) = create_test_app();

    let (status, json) = post_json(&app, "/webauthn/registration/verify", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");

    let (status, json) = post_json(
        &app,
        "/webauthn/authentication/verify",
        json!({"challenge": "abc"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_invalid_json_rejected() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/webauthn/authentication/verify")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_oversized_body_rejected_with_error_shape() {
    let (app, _) = create_test_app();
    let oversized = json!({"challenge": "a".repeat(80 * 1024)}).to_string();

    for uri in [
        "/webauthn/authentication/options",
        "/webauthn/authentication/verify",
        "/webauthn/registration/verify",
    ] {
        // Streamed body, rejected while the extractor buffers it
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(oversized.clone()))
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{uri}");
        assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE", "{uri}");

        // Declared length, rejected before routing
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .header("Content-Length", oversized.len())
            .body(Body::from(oversized.clone()))
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{uri}");
        assert_eq!(json["error"]["code"], "PAYLOAD_TOO_LARGE", "{uri}");
    }
}

#[tokio::test]
async fn test_padded_credential_id_authenticates() {
    let (app, _) = create_test_app();
    let device = SoftAuthenticator::ed25519(13, RP_ID, ORIGIN);
    register(&app, &device).await;

    let mut assertion = device.authenticate("padded");
    assertion.id = device.padded_credential_id();
    assertion.raw_id = device.padded_credential_id();
    let (status, json) = post_json(
        &app,
        "/webauthn/authentication/verify",
        json!({"assertion": assertion, "challenge": "padded"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["credentialId"], device.credential_id());
}

#[tokio::test]
async fn test_incomplete_proof_rejected() {
    let (app, _) = create_test_app();

    let (status, json) = post_json(
        &app,
        "/webauthn/registration/verify",
        json!({
            "attestation": {"id": "AA", "rawId": "AA", "type": "public-key", "response": {}},
            "challenge": "abc"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_REQUEST");
}

// ============================================================================
// Issued-Challenge Tracking Tests
// ============================================================================

#[tokio::test]
async fn test_tracked_challenge_is_single_use() {
    let app = create_tracking_app();
    let device = SoftAuthenticator::es256(8, RP_ID, ORIGIN);

    let (status, _) = register(&app, &device).await;
    assert_eq!(status, StatusCode::OK);

    let (_, options) = post_json(&app, "/webauthn/authentication/options", json!({})).await;
    let challenge = options["challenge"].as_str().unwrap().to_string();
    let body = json!({"assertion": device.authenticate(&challenge), "challenge": challenge});

    let (status, _) = post_json(&app, "/webauthn/authentication/verify", body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(&app, "/webauthn/authentication/verify", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VERIFICATION_FAILED");
}

#[tokio::test]
async fn test_untracked_challenge_rejected() {
    let app = create_tracking_app();
    let device = SoftAuthenticator::es256(9, RP_ID, ORIGIN);

    let (status, json) = post_json(
        &app,
        "/webauthn/registration/verify",
        json!({"attestation": device.register("made-up"), "challenge": "made-up"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VERIFICATION_FAILED");
}
