//! Registration and authentication ceremonies
//!
//! [`Ceremony`] is the only place that knows the order of operations:
//! verification first, then the counter policy, then a single conditional
//! store write. Any failure returns before a write happens.

use std::sync::Arc;

use crate::config::RelyingParty;
use crate::credential::{Credential, NewCredential};
use crate::error::{PasskeyError, Result};
use crate::options::{self, AuthenticationOptions, RegistrationOptions};
use crate::replay::{check_counter, CounterDecision};
use crate::store::CredentialStore;
use crate::types::{
    AuthenticationOutcome, AuthenticationRequest, RegistrationOutcome, RegistrationRequest,
};
use crate::verify::{
    assertion_credential_id, verify_authentication, verify_registration, Expectations,
};

/// Relying party ceremonies over a credential store
#[derive(Clone)]
pub struct Ceremony {
    rp: RelyingParty,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for Ceremony {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ceremony")
            .field("rp", &self.rp)
            .field("store", &self.store.backend())
            .finish()
    }
}

impl Ceremony {
    pub fn new(rp: RelyingParty, store: Arc<dyn CredentialStore>) -> Self {
        Self { rp, store }
    }

    pub fn relying_party(&self) -> &RelyingParty {
        &self.rp
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn registration_options(&self) -> Result<RegistrationOptions> {
        tracing::debug!(rp_id = %self.rp.id(), "registration options requested");
        let options = options::registration_options(&self.rp)?;
        tracing::info!(rp_id = %self.rp.id(), "registration options generated");
        Ok(options)
    }

    /// Authentication options, restricted to the hinted credential when it
    /// is registered. An unknown hint or a failed lookup is not an error.
    pub async fn authentication_options(
        &self,
        credential_id_hint: Option<&str>,
    ) -> Result<AuthenticationOptions> {
        tracing::debug!(
            has_hint = credential_id_hint.is_some(),
            "authentication options requested"
        );

        let hinted = match credential_id_hint.filter(|hint| !hint.is_empty()) {
            Some(hint) => match self.store.get(hint).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(
                        credential_id = %hint,
                        error = %e,
                        "credential hint lookup failed, allowing any credential"
                    );
                    None
                }
            },
            None => None,
        };

        let options = options::authentication_options(&self.rp, hinted.as_ref())?;
        tracing::info!(
            rp_id = %self.rp.id(),
            restricted = options.allow_credentials.is_some(),
            "authentication options generated"
        );
        Ok(options)
    }

    /// Verify an attestation and store the new credential
    pub async fn register(&self, request: RegistrationRequest) -> Result<RegistrationOutcome> {
        let (Some(attestation), Some(challenge)) = (request.attestation, request.challenge) else {
            return Err(PasskeyError::invalid_request(
                "attestation and challenge are required",
            ));
        };
        if challenge.is_empty() {
            return Err(PasskeyError::invalid_request("challenge is empty"));
        }

        tracing::debug!(credential_id = %attestation.id, "registration verify requested");

        let verified = verify_registration(&attestation, &self.expectations(&challenge))
            .inspect_err(|e| {
                tracing::warn!(credential_id = %attestation.id, error = %e, "registration verification failed");
            })?;

        let credential = Credential::create(NewCredential {
            credential_id: verified.credential_id,
            public_key: verified.public_key,
            counter: verified.counter,
            transports: verified.transports,
            backed_up: verified.backed_up,
            device_type: verified.device_type,
        });

        self.store.create(&credential).await.map_err(|e| {
            tracing::warn!(credential_id = %credential.credential_id, error = %e, "credential not stored");
            PasskeyError::from(e)
        })?;

        tracing::info!(
            credential_id = %credential.credential_id,
            counter = credential.counter,
            device_type = credential.device_type.as_str(),
            backed_up = credential.backed_up,
            algorithm = verified.algorithm,
            fmt = %verified.fmt,
            "registration completed"
        );

        Ok(RegistrationOutcome {
            ok: true,
            credential_id: credential.credential_id,
        })
    }

    /// Verify an assertion against the stored key and apply the counter policy
    pub async fn authenticate(
        &self,
        request: AuthenticationRequest,
    ) -> Result<AuthenticationOutcome> {
        let (Some(assertion), Some(challenge)) = (request.assertion, request.challenge) else {
            return Err(PasskeyError::invalid_request(
                "assertion and challenge are required",
            ));
        };
        if challenge.is_empty() || assertion.id.is_empty() {
            return Err(PasskeyError::invalid_request(
                "challenge and credential ID must not be empty",
            ));
        }

        // Only a decoded, id/rawId-consistent ID is used as a store key
        let credential_id = assertion_credential_id(&assertion).inspect_err(|e| {
            tracing::warn!(error = %e, "authentication failed: malformed credential ID");
        })?;
        tracing::debug!(credential_id = %credential_id, "authentication verify requested");

        let Some(stored) = self.store.get(&credential_id).await? else {
            tracing::warn!(credential_id = %credential_id, "authentication failed: credential not found");
            return Err(PasskeyError::CredentialNotFound(credential_id));
        };

        let verified = verify_authentication(
            &assertion,
            &self.expectations(&challenge),
            &stored.public_key,
        )
        .inspect_err(|e| {
            tracing::warn!(credential_id = %credential_id, error = %e, "authentication verification failed");
        })?;

        let decision = check_counter(stored.counter, verified.new_counter).inspect_err(|_| {
            tracing::error!(
                credential_id = %credential_id,
                stored_counter = stored.counter,
                received_counter = verified.new_counter,
                "authentication failed: counter did not increase, possible cloned authenticator"
            );
        })?;

        match decision {
            CounterDecision::Unenforced => {
                tracing::debug!(credential_id = %credential_id, "counter not in use, nothing to persist");
            }
            CounterDecision::Advance { from, to } => {
                self.store
                    .update_counter(&credential_id, to, from)
                    .await
                    .map_err(|e| {
                        tracing::warn!(credential_id = %credential_id, error = %e, "counter update failed");
                        PasskeyError::from(e)
                    })?;
                tracing::debug!(credential_id = %credential_id, from, to, "counter updated");
            }
        }

        tracing::info!(
            credential_id = %credential_id,
            new_counter = verified.new_counter,
            user_verified = verified.user_verified,
            "authentication completed"
        );

        Ok(AuthenticationOutcome {
            ok: true,
            credential_id,
            new_counter: verified.new_counter,
        })
    }

    fn expectations<'a>(&'a self, challenge: &'a str) -> Expectations<'a> {
        Expectations {
            challenge,
            origin: self.rp.origin(),
            rp_id: self.rp.id(),
        }
    }
}
