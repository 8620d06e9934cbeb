//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use passkey_core::Ceremony;

use crate::challenges::ChallengeRegistry;

/// Application state containing shared resources.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Ceremonies over the configured credential store
    pub ceremony: Arc<Ceremony>,
    /// Issued-challenge tracking, when enabled
    pub challenges: Option<Arc<ChallengeRegistry>>,
}

impl AppState {
    pub fn new(ceremony: Ceremony) -> Self {
        Self {
            ceremony: Arc::new(ceremony),
            challenges: None,
        }
    }

    pub fn with_challenge_registry(mut self, registry: Arc<ChallengeRegistry>) -> Self {
        self.challenges = Some(registry);
        self
    }
}
