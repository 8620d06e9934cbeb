//! Signature counter policy
//!
//! A stored counter of 0 means the authenticator does not implement counters:
//! enforcement is off for that credential and the received value is never
//! written back, otherwise a later 0 would look like a regression. A cloned
//! authenticator that also reports 0 is not detected.

use crate::error::{PasskeyError, Result};

/// Outcome of comparing a received counter against the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDecision {
    /// Counters are not in use for this credential; nothing to persist
    Unenforced,
    /// Counter increased and must be persisted with compare-and-swap on `from`
    Advance { from: u32, to: u32 },
}

/// Apply the counter policy
///
/// Fails with [`PasskeyError::InvalidCounter`] when a non-zero stored counter
/// did not strictly increase.
pub fn check_counter(stored: u32, received: u32) -> Result<CounterDecision> {
    if stored == 0 {
        return Ok(CounterDecision::Unenforced);
    }
    if received <= stored {
        return Err(PasskeyError::InvalidCounter { stored, received });
    }
    Ok(CounterDecision::Advance {
        from: stored,
        to: received,
    })
}
