//! PostgreSQL storage for passkey credentials
//!
//! Conditional writes carry the atomicity: `ON CONFLICT DO NOTHING` for
//! create-once and `WHERE counter = $expected` for compare-and-swap. The
//! outcome is read from `rows_affected`.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::credential::{Credential, DeviceType};

/// PostgreSQL-backed credential storage
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    /// Connect with a bounded pool
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!("Connected to PostgreSQL database");
        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, credential: &Credential) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO passkey_credentials
                (credential_id, public_key, counter, transports, backed_up,
                 device_type, user_handle, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (credential_id) DO NOTHING
            "#,
        )
        .bind(&credential.credential_id)
        .bind(&credential.public_key)
        .bind(i64::from(credential.counter))
        .bind(&credential.transports)
        .bind(credential.backed_up)
        .bind(credential.device_type.as_str())
        .bind(credential.user_handle)
        .bind(credential.created_at)
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(credential.credential_id.clone()));
        }

        tracing::info!(
            credential_id = %credential.credential_id,
            device_type = credential.device_type.as_str(),
            backed_up = credential.backed_up,
            "Credential stored in database"
        );
        Ok(())
    }

    async fn get(&self, credential_id: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT credential_id, public_key, counter, transports, backed_up,
                   device_type, user_handle, created_at, updated_at
            FROM passkey_credentials
            WHERE credential_id = $1
            "#,
        )
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(CredentialRow::into_credential).transpose()
    }

    async fn update_counter(
        &self,
        credential_id: &str,
        new_counter: u32,
        expected_counter: u32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE passkey_credentials
            SET counter = $2, updated_at = NOW()
            WHERE credential_id = $1 AND counter = $3
            "#,
        )
        .bind(credential_id)
        .bind(i64::from(new_counter))
        .bind(i64::from(expected_counter))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ConcurrentModification(
                credential_id.to_string(),
            ));
        }

        tracing::debug!(
            credential_id = %credential_id,
            old_counter = expected_counter,
            new_counter,
            "Counter updated"
        );
        Ok(())
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// Database row for credentials
#[derive(sqlx::FromRow)]
struct CredentialRow {
    credential_id: String,
    public_key: String,
    counter: i64,
    transports: Vec<String>,
    backed_up: bool,
    device_type: String,
    user_handle: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl CredentialRow {
    fn into_credential(self) -> Result<Credential, StoreError> {
        let counter = u32::try_from(self.counter).map_err(|_| {
            StoreError::Serialization(format!("counter out of range: {}", self.counter))
        })?;
        let device_type = DeviceType::parse(&self.device_type).ok_or_else(|| {
            StoreError::Serialization(format!("unknown device type: {}", self.device_type))
        })?;

        Ok(Credential {
            credential_id: self.credential_id,
            public_key: self.public_key,
            counter,
            transports: self.transports,
            backed_up: self.backed_up,
            device_type,
            user_handle: self.user_handle,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl std::fmt::Debug for PostgresCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCredentialStore")
            .field("pool", &"<PgPool>")
            .finish()
    }
}
