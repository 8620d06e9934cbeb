//! Credential storage
//!
//! Two narrow mutation contracts, both atomic in every backend:
//! - **create**: insert only if no record exists for the credential ID
//! - **update_counter**: compare-and-swap on the stored counter
//!
//! Backends:
//! - `memory`: `DashMap`, for development and tests (lost on restart)
//! - `postgres`: conditional `INSERT`/`UPDATE` statements via sqlx

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryCredentialStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCredentialStore;

use async_trait::async_trait;

use crate::credential::Credential;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Credential already exists: {0}")]
    AlreadyExists(String),

    #[error("Counter compare-and-swap lost for credential {0}")]
    ConcurrentModification(String),

    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Durable credential persistence
///
/// Implementations must be safe to share across concurrent requests and
/// processes; all coordination goes through the two conditional writes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new credential, failing with [`StoreError::AlreadyExists`]
    /// if the credential ID is already taken. Never overwrites.
    async fn create(&self, credential: &Credential) -> Result<(), StoreError>;

    /// Point lookup by credential ID
    async fn get(&self, credential_id: &str) -> Result<Option<Credential>, StoreError>;

    /// Set the counter to `new_counter` only if it still equals
    /// `expected_counter`, failing with [`StoreError::ConcurrentModification`]
    /// otherwise (including when the record has vanished).
    async fn update_counter(
        &self,
        credential_id: &str,
        new_counter: u32,
        expected_counter: u32,
    ) -> Result<(), StoreError>;

    /// Check backend reachability
    async fn check_health(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Backend name for health reporting
    fn backend(&self) -> &'static str;
}
