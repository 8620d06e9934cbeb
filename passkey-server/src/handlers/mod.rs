//! HTTP request handlers module

pub mod authentication;
pub mod health;
pub mod registration;

pub use authentication::{authentication_options, authentication_verify};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use registration::{registration_options, registration_verify};
