use ciborium::value::Value;

use super::cose::CosePublicKey;
use crate::error::{PasskeyError, Result};

/// Decoded attestation object: `{fmt, attStmt, authData}`
#[derive(Debug)]
pub(crate) struct AttestationObject {
    pub fmt: String,
    pub att_stmt: Vec<(Value, Value)>,
    pub auth_data: Vec<u8>,
}

impl AttestationObject {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = ciborium::from_reader(bytes).map_err(|e| {
            PasskeyError::verification(format!("attestation object is not CBOR: {e}"))
        })?;
        let Value::Map(entries) = value else {
            return Err(PasskeyError::verification("attestation object is not a map"));
        };

        let mut fmt = None;
        let mut att_stmt = None;
        let mut auth_data = None;
        for (key, value) in entries {
            match (key, value) {
                (Value::Text(k), Value::Text(v)) if k == "fmt" => fmt = Some(v),
                (Value::Text(k), Value::Map(v)) if k == "attStmt" => att_stmt = Some(v),
                (Value::Text(k), Value::Bytes(v)) if k == "authData" => auth_data = Some(v),
                _ => {}
            }
        }

        match (fmt, att_stmt, auth_data) {
            (Some(fmt), Some(att_stmt), Some(auth_data)) => Ok(Self {
                fmt,
                att_stmt,
                auth_data,
            }),
            _ => Err(PasskeyError::verification(
                "attestation object missing fmt, attStmt or authData",
            )),
        }
    }

    /// Check the attestation statement against the credential's own key
    ///
    /// Accepted: `none` with an empty statement, and `packed` self
    /// attestation (no certificate chain).
    pub fn verify_statement(&self, credential_key: &CosePublicKey, client_data_hash: &[u8]) -> Result<()> {
        match self.fmt.as_str() {
            "none" => {
                if self.att_stmt.is_empty() {
                    Ok(())
                } else {
                    Err(PasskeyError::verification("non-empty statement for fmt none"))
                }
            }
            "packed" => self.verify_packed_self(credential_key, client_data_hash),
            other => Err(PasskeyError::verification(format!(
                "unsupported attestation format {other}"
            ))),
        }
    }

    fn verify_packed_self(&self, credential_key: &CosePublicKey, client_data_hash: &[u8]) -> Result<()> {
        let mut alg = None;
        let mut sig = None;
        for (key, value) in &self.att_stmt {
            let Value::Text(name) = key else { continue };
            match (name.as_str(), value) {
                ("alg", Value::Integer(i)) => alg = Some(i128::from(*i)),
                ("sig", Value::Bytes(b)) => sig = Some(b.as_slice()),
                ("x5c", _) | ("ecdaaKeyId", _) => {
                    return Err(PasskeyError::verification(
                        "certificate-based packed attestation is not supported",
                    ));
                }
                _ => {}
            }
        }

        let (Some(alg), Some(sig)) = (alg, sig) else {
            return Err(PasskeyError::verification("packed statement missing alg or sig"));
        };
        if alg != i128::from(credential_key.algorithm()) {
            return Err(PasskeyError::verification(format!(
                "packed statement alg {alg} does not match credential key"
            )));
        }

        let mut signed = Vec::with_capacity(self.auth_data.len() + client_data_hash.len());
        signed.extend_from_slice(&self.auth_data);
        signed.extend_from_slice(client_data_hash);
        credential_key.verify(&signed, sig)
    }
}
