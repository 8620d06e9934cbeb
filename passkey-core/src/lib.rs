//! Passkey Core - relying-party side of WebAuthn passkey ceremonies
//!
//! This crate issues ceremony options, verifies authenticator responses and
//! enforces the signature-counter replay guard on top of a pluggable
//! credential store.
//!
//! # Features
//!
//! - Usernameless registration and authentication (discoverable credentials)
//! - EdDSA (Ed25519), ES256 (P-256) and RS256 (RSA PKCS#1 v1.5) credential keys
//! - `none` and `packed` self attestation
//! - Create-once and compare-and-swap storage contracts, in memory or PostgreSQL
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use passkey_core::{Ceremony, MemoryCredentialStore, RelyingParty, RegistrationRequest};
//!
//! # async fn example(request: RegistrationRequest) -> passkey_core::Result<()> {
//! let rp = RelyingParty::new("example.com", "Example", "https://example.com")?;
//! let ceremony = Ceremony::new(rp, Arc::new(MemoryCredentialStore::new()));
//!
//! // Send these to navigator.credentials.create()
//! let options = ceremony.registration_options()?;
//!
//! // The client echoes options.challenge back with its attestation
//! let outcome = ceremony.register(request).await?;
//! println!("registered {}", outcome.credential_id);
//! # Ok(())
//! # }
//! ```

pub mod ceremony;
pub mod config;
pub mod credential;
pub mod encoding;
pub mod error;
pub mod options;
pub mod replay;
pub mod store;
pub mod types;
pub mod verify;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export main types for convenience
pub use ceremony::Ceremony;
pub use config::{ConfigError, RelyingParty};
pub use credential::{Credential, DeviceType, NewCredential};
pub use error::{PasskeyError, Result};
pub use options::{AuthenticationOptions, RegistrationOptions, CEREMONY_TIMEOUT_MS};
pub use replay::{check_counter, CounterDecision};
pub use store::{CredentialStore, MemoryCredentialStore, StoreError};
pub use types::{
    AuthenticationCredential, AuthenticationOptionsRequest, AuthenticationOutcome,
    AuthenticationRequest, RegistrationCredential, RegistrationOutcome, RegistrationRequest,
};
pub use verify::{verify_authentication, verify_registration, Expectations};

#[cfg(feature = "postgres")]
pub use store::PostgresCredentialStore;
