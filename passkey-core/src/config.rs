//! Relying Party configuration
//!
//! The relying party identity is the only configuration the ceremonies need.
//! All three values are required; a missing value is fatal at start-up.

use url::Url;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid origin URL: {0}")]
    InvalidOrigin(String),
    #[error("Invalid relying party ID: {0}")]
    InvalidRpId(String),
}

/// Relying Party identity used for options and verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    id: String,
    name: String,
    origin: String,
}

impl RelyingParty {
    /// Create and validate a relying party configuration
    ///
    /// # Arguments
    ///
    /// * `rp_id` - Relying Party ID (the effective domain, no scheme or port)
    /// * `rp_name` - Human-readable name for the Relying Party
    /// * `origin` - Expected origin of client data (e.g. `https://example.com`)
    pub fn new(rp_id: &str, rp_name: &str, origin: &str) -> Result<Self, ConfigError> {
        let rp_id = rp_id.trim();
        let rp_name = rp_name.trim();
        let origin = origin.trim();

        if rp_id.is_empty() {
            return Err(ConfigError::Missing("RP_ID"));
        }
        if rp_name.is_empty() {
            return Err(ConfigError::Missing("RP_NAME"));
        }
        if origin.is_empty() {
            return Err(ConfigError::Missing("ORIGIN"));
        }
        if rp_id.contains("://") || rp_id.contains('/') || rp_id.contains(':') {
            return Err(ConfigError::InvalidRpId(rp_id.to_string()));
        }

        let url = Url::parse(origin).map_err(|e| ConfigError::InvalidOrigin(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidOrigin(origin.to_string()));
        }

        // Client data carries the serialized origin, which never has a trailing slash
        Ok(Self {
            id: rp_id.to_string(),
            name: rp_name.to_string(),
            origin: url.origin().ascii_serialization(),
        })
    }

    /// Load from environment variables
    ///
    /// Environment variables (all required):
    /// - `RP_ID` - Relying Party ID
    /// - `RP_NAME` - RP display name
    /// - `ORIGIN` - Expected client origin
    pub fn from_env() -> Result<Self, ConfigError> {
        let rp_id = std::env::var("RP_ID").map_err(|_| ConfigError::Missing("RP_ID"))?;
        let rp_name = std::env::var("RP_NAME").map_err(|_| ConfigError::Missing("RP_NAME"))?;
        let origin = std::env::var("ORIGIN").map_err(|_| ConfigError::Missing("ORIGIN"))?;

        Self::new(&rp_id, &rp_name, &origin)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Origin in serialized form (`scheme://host[:port]`)
    pub fn origin(&self) -> &str {
        &self.origin
    }
}
