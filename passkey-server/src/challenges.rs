//! Issued-challenge registry
//!
//! Optional server-side tracking of the challenges handed out by the options
//! endpoints. When enabled, a verify call must present a challenge that was
//! issued for the same ceremony, has not expired and has not been used. The
//! challenge is consumed before verification runs, so a failed attempt also
//! burns it.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use passkey_core::PasskeyError;

/// Ceremony a challenge was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

#[derive(Debug)]
struct IssuedChallenge {
    kind: CeremonyKind,
    expires_at: Instant,
}

/// Single-use challenges with a time-to-live
#[derive(Debug)]
pub struct ChallengeRegistry {
    issued: DashMap<String, IssuedChallenge>,
    ttl: Duration,
}

impl ChallengeRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            issued: DashMap::new(),
            ttl,
        }
    }

    /// Record a freshly issued challenge
    pub fn issue(&self, challenge: &str, kind: CeremonyKind) {
        self.issued.insert(
            challenge.to_string(),
            IssuedChallenge {
                kind,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove the challenge and check it was valid for `kind`
    pub fn consume(&self, challenge: &str, kind: CeremonyKind) -> Result<(), PasskeyError> {
        let Some((_, issued)) = self.issued.remove(challenge) else {
            return Err(PasskeyError::VerificationFailed(
                "challenge was not issued or was already used".to_string(),
            ));
        };
        if issued.kind != kind {
            return Err(PasskeyError::VerificationFailed(format!(
                "challenge was issued for {:?}",
                issued.kind
            )));
        }
        if Instant::now() >= issued.expires_at {
            return Err(PasskeyError::VerificationFailed("challenge expired".to_string()));
        }
        Ok(())
    }

    /// Drop expired challenges, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.issued.len();
        self.issued.retain(|_, issued| issued.expires_at > now);
        before.saturating_sub(self.issued.len())
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
