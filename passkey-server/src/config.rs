//! Server configuration module
//!
//! Transport settings loaded from environment variables with sensible
//! defaults. The relying party identity lives in `passkey_core::RelyingParty`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: IpAddr,
    /// Allowed CORS origins, comma-separated (default: the RP origin)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in KB (default: 64)
    pub body_limit_kb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 10)
    pub database_max_connections: u32,
    /// Track issued challenges server-side (default: false)
    pub track_challenges: bool,
    /// Lifetime of a tracked challenge in seconds (default: 60)
    pub challenge_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            allowed_origins: None,
            body_limit_kb: 64,
            timeout_secs: 30,
            database_url: None,
            database_max_connections: 10,
            track_challenges: false,
            challenge_ttl_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT").unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|h| h.parse().ok())
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|origins| parse_origins(&origins))
            .filter(|origins| !origins.is_empty());

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let track_challenges = std::env::var("TRACK_CHALLENGES")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(defaults.track_challenges);

        Self {
            port,
            host,
            allowed_origins,
            body_limit_kb: env_parse("BODY_LIMIT_KB").unwrap_or(defaults.body_limit_kb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            database_url,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            track_challenges,
            challenge_ttl_secs: env_parse("CHALLENGE_TTL_SECS")
                .unwrap_or(defaults.challenge_ttl_secs),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// CORS origins, falling back to the relying party origin
    pub fn cors_origins(&self, rp_origin: &str) -> Vec<String> {
        match &self.allowed_origins {
            Some(origins) => origins.clone(),
            None => vec![rp_origin.to_string()],
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
