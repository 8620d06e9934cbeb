//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Service name
    pub service: &'static str,
    /// Credential store backend ("memory" or "postgres")
    pub storage: &'static str,
    /// Whether the credential store answered
    pub storage_reachable: bool,
}

/// GET /health - Health check endpoint
///
/// Reports degraded when the credential store does not answer.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.ceremony.store();
    let storage_reachable = match store.check_health().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, backend = store.backend(), "Credential store health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if storage_reachable { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        service: "passkey-server",
        storage: store.backend(),
        storage_reachable,
    })
}

/// Readiness response
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /ready - Readiness check
///
/// 503 until the credential store is reachable.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to accept traffic", body = ReadyResponse),
        (status = 503, description = "Credential store unreachable", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    match state.ceremony.store().check_health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some("credential store unreachable"),
            }),
        ),
    }
}
