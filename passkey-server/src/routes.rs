//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::{
    authentication_options, authentication_verify, health, ready, registration_options,
    registration_verify,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;

const CORS_MAX_AGE: Duration = Duration::from_secs(600);

/// Create the application router
pub fn create_router(state: AppState, config: &Config) -> Router {
    let rp_origin = state.ceremony.relying_party().origin().to_string();
    let origins: Vec<HeaderValue> = config
        .cors_origins(&rp_origin)
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "CORS: ignoring unparsable origin");
                None
            }
        })
        .collect();
    tracing::info!("CORS: Restricting to {} origin(s)", origins.len());

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE);

    // Request body limit
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_kb * 1024);

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    let webauthn = Router::new()
        .route("/registration/options", post(registration_options))
        .route("/registration/verify", post(registration_verify))
        .route("/authentication/options", post(authentication_options))
        .route("/authentication/verify", post(authentication_verify));

    Router::new()
        .nest("/webauthn", webauthn)
        .route("/health", get(health))
        .route("/ready", get(ready))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(body_limit)
        .layer(middleware::map_response(payload_too_large_as_json))
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
}

/// The body limit layer rejects a declared oversized `Content-Length` with a
/// plain-text 413 before any handler runs; give it the API error shape.
async fn payload_too_large_as_json(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return ApiError::PayloadTooLarge.into_response();
    }
    response
}
