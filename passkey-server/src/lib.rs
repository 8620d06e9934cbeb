//! Passkey Server Library - HTTP API for passkey ceremonies
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod challenges;
pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

pub use challenges::{CeremonyKind, ChallengeRegistry};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
