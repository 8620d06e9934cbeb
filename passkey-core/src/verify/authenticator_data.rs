use ciborium::value::Value;

use crate::error::{PasskeyError, Result};

const FLAG_UP: u8 = 0x01;
const FLAG_UV: u8 = 0x04;
const FLAG_BE: u8 = 0x08;
const FLAG_BS: u8 = 0x10;
const FLAG_AT: u8 = 0x40;
const FLAG_ED: u8 = 0x80;

/// rpIdHash (32) + flags (1) + signCount (4)
const MIN_LEN: usize = 37;
/// aaguid (16) + credentialIdLength (2)
const ATTESTED_HEADER_LEN: usize = 18;
const MAX_CREDENTIAL_ID_LEN: usize = 1023;

/// Parsed `authenticatorData`
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    pub sign_count: u32,
    pub attested: Option<AttestedCredentialData>,
}

/// Attested credential data, present only on registration
#[derive(Debug, Clone)]
pub(crate) struct AttestedCredentialData {
    pub aaguid: [u8; 16],
    pub credential_id: Vec<u8>,
    /// COSE_Key bytes exactly as the authenticator encoded them
    pub public_key: Vec<u8>,
}

impl AuthenticatorData {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_LEN {
            return Err(PasskeyError::verification(format!(
                "authenticator data too short: {} bytes",
                bytes.len()
            )));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let flags = bytes[32];
        let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

        let mut rest = &bytes[MIN_LEN..];

        let attested = if flags & FLAG_AT != 0 {
            if rest.len() < ATTESTED_HEADER_LEN {
                return Err(PasskeyError::verification("attested credential data truncated"));
            }
            let mut aaguid = [0u8; 16];
            aaguid.copy_from_slice(&rest[..16]);
            let id_len = usize::from(u16::from_be_bytes([rest[16], rest[17]]));
            rest = &rest[ATTESTED_HEADER_LEN..];

            if id_len == 0 || id_len > MAX_CREDENTIAL_ID_LEN || rest.len() < id_len {
                return Err(PasskeyError::verification(format!(
                    "invalid credential ID length {id_len}"
                )));
            }
            let credential_id = rest[..id_len].to_vec();
            rest = &rest[id_len..];

            let public_key = take_cbor_item(&mut rest, "credential public key")?;
            Some(AttestedCredentialData {
                aaguid,
                credential_id,
                public_key,
            })
        } else {
            None
        };

        if flags & FLAG_ED != 0 {
            take_cbor_item(&mut rest, "extensions")?;
        }
        if !rest.is_empty() {
            return Err(PasskeyError::verification(format!(
                "{} trailing bytes in authenticator data",
                rest.len()
            )));
        }

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested,
        })
    }

    pub fn user_present(&self) -> bool {
        self.flags & FLAG_UP != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_UV != 0
    }

    pub fn backup_eligible(&self) -> bool {
        self.flags & FLAG_BE != 0
    }

    pub fn backed_up(&self) -> bool {
        self.flags & FLAG_BS != 0
    }

    /// Common flag checks for both ceremonies
    ///
    /// Both UP and UV are required: `userVerification: "preferred"` only
    /// shapes the browser prompt, it does not relax the check here.
    pub fn check_flags(&self) -> Result<()> {
        if !self.user_present() {
            return Err(PasskeyError::verification("user presence flag not set"));
        }
        if !self.user_verified() {
            return Err(PasskeyError::verification("user verification flag not set"));
        }
        // A credential cannot be backed up without being backup-eligible
        if self.backed_up() && !self.backup_eligible() {
            return Err(PasskeyError::verification("backup state without eligibility"));
        }
        Ok(())
    }
}

/// Consume one CBOR data item from the front of `input`, returning its bytes
fn take_cbor_item(input: &mut &[u8], what: &str) -> Result<Vec<u8>> {
    let start = *input;
    let _: Value = ciborium::from_reader(&mut *input)
        .map_err(|e| PasskeyError::verification(format!("{what} is not valid CBOR: {e}")))?;
    let consumed = start.len() - input.len();
    Ok(start[..consumed].to_vec())
}
