//! Passkey Server - relying party API for passkey registration and sign-in
//!
//! Endpoints:
//! - POST /webauthn/registration/options
//! - POST /webauthn/registration/verify
//! - POST /webauthn/authentication/options
//! - POST /webauthn/authentication/verify
//! - GET  /health, GET /ready, GET /docs

use std::sync::Arc;
use std::time::Duration;

use passkey_core::{Ceremony, CredentialStore, MemoryCredentialStore, RelyingParty};
use passkey_server::{create_router, AppState, ChallengeRegistry, Config};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passkey_server=debug,passkey_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing or invalid relying party settings are fatal
    let rp = RelyingParty::from_env().inspect_err(|e| {
        tracing::error!(error = %e, code = "CONFIGURATION_ERROR", "Invalid relying party configuration");
    })?;
    let config = Config::from_env();
    tracing::info!(rp_id = %rp.id(), origin = %rp.origin(), "Relying party configured");

    let store = credential_store(&config).await?;
    let mut state = AppState::new(Ceremony::new(rp, store));

    if config.track_challenges {
        let registry = Arc::new(ChallengeRegistry::new(Duration::from_secs(
            config.challenge_ttl_secs,
        )));
        spawn_challenge_cleanup(Arc::clone(&registry), config.challenge_ttl_secs);
        state = state.with_challenge_registry(registry);
        tracing::info!(ttl_secs = config.challenge_ttl_secs, "Issued-challenge tracking enabled");
    }

    let app = create_router(state, &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn credential_store(config: &Config) -> Result<Arc<dyn CredentialStore>, BoxError> {
    match &config.database_url {
        Some(url) => {
            let store = passkey_core::PostgresCredentialStore::new(
                url,
                config.database_max_connections,
            )
            .await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => Ok(memory_store()),
    }
}

#[cfg(not(feature = "postgres"))]
async fn credential_store(config: &Config) -> Result<Arc<dyn CredentialStore>, BoxError> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but PostgreSQL support is not compiled in");
    }
    Ok(memory_store())
}

fn memory_store() -> Arc<dyn CredentialStore> {
    tracing::warn!("Using in-memory credential store: credentials are lost on restart");
    Arc::new(MemoryCredentialStore::new())
}

fn spawn_challenge_cleanup(registry: Arc<ChallengeRegistry>, ttl_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(ttl_secs.max(1)));
        loop {
            interval.tick().await;
            let removed = registry.cleanup_expired();
            if removed > 0 {
                tracing::debug!(removed, "Expired challenges removed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
