//! COSE_Key decoding and signature verification
//!
//! Accepted algorithms: EdDSA (Ed25519, COSE -8), ES256 (ECDSA P-256 /
//! SHA-256, COSE -7) and RS256 (RSASSA-PKCS1-v1_5 / SHA-256, COSE -257).
//! Keys are stored as the raw COSE bytes the authenticator produced and
//! decoded again on every assertion.

use ciborium::value::Value;
use p256::ecdsa::signature::Verifier as _;
use sha2::Sha256;

use crate::error::{PasskeyError, Result};

/// COSE algorithm identifier for ES256
pub const ALG_ES256: i64 = -7;
/// COSE algorithm identifier for EdDSA
pub const ALG_EDDSA: i64 = -8;
/// COSE algorithm identifier for RS256
pub const ALG_RS256: i64 = -257;
/// Advertised algorithms, in order of preference
pub const SUPPORTED_ALGORITHMS: [i64; 3] = [ALG_EDDSA, ALG_ES256, ALG_RS256];

const LABEL_KTY: i128 = 1;
const LABEL_ALG: i128 = 3;
const LABEL_CRV: i128 = -1;
const LABEL_X: i128 = -2;
const LABEL_Y: i128 = -3;
const LABEL_N: i128 = -1;
const LABEL_E: i128 = -2;

const KTY_OKP: i128 = 1;
const KTY_EC2: i128 = 2;
const KTY_RSA: i128 = 3;
const CRV_P256: i128 = 1;
const CRV_ED25519: i128 = 6;

const MIN_RSA_MODULUS_BITS: usize = 2048;

/// A credential public key decoded from COSE
#[derive(Debug, Clone)]
pub(crate) enum CosePublicKey {
    Es256(p256::ecdsa::VerifyingKey),
    EdDsa(ed25519_dalek::VerifyingKey),
    Rs256(rsa::pkcs1v15::VerifyingKey<Sha256>),
}

impl CosePublicKey {
    pub fn from_cose(bytes: &[u8]) -> Result<Self> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| PasskeyError::verification(format!("COSE key is not CBOR: {e}")))?;
        let Value::Map(entries) = value else {
            return Err(PasskeyError::verification("COSE key is not a map"));
        };

        let kty = int_label(&entries, LABEL_KTY)?;
        let alg = int_label(&entries, LABEL_ALG)?;

        match (kty, alg) {
            (KTY_EC2, a) if a == i128::from(ALG_ES256) => {
                expect_curve(&entries, CRV_P256)?;
                let x = bytes_label(&entries, LABEL_X, 32)?;
                let y = bytes_label(&entries, LABEL_Y, 32)?;
                let mut sec1 = Vec::with_capacity(65);
                sec1.push(0x04);
                sec1.extend_from_slice(x);
                sec1.extend_from_slice(y);
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
                    .map_err(|_| PasskeyError::verification("P-256 point not on curve"))?;
                Ok(Self::Es256(key))
            }
            (KTY_OKP, a) if a == i128::from(ALG_EDDSA) => {
                expect_curve(&entries, CRV_ED25519)?;
                let x = bytes_label(&entries, LABEL_X, 32)?;
                let mut raw = [0u8; 32];
                raw.copy_from_slice(x);
                let key = ed25519_dalek::VerifyingKey::from_bytes(&raw)
                    .map_err(|_| PasskeyError::verification("invalid Ed25519 public key"))?;
                Ok(Self::EdDsa(key))
            }
            (KTY_RSA, a) if a == i128::from(ALG_RS256) => {
                let n = rsa::BigUint::from_bytes_be(any_bytes_label(&entries, LABEL_N)?);
                let e = rsa::BigUint::from_bytes_be(any_bytes_label(&entries, LABEL_E)?);
                if n.bits() < MIN_RSA_MODULUS_BITS {
                    return Err(PasskeyError::verification(format!(
                        "RSA modulus of {} bits is too short",
                        n.bits()
                    )));
                }
                let public = rsa::RsaPublicKey::new(n, e)
                    .map_err(|e| PasskeyError::verification(format!("invalid RSA key: {e}")))?;
                Ok(Self::Rs256(rsa::pkcs1v15::VerifyingKey::new(public)))
            }
            (kty, alg) => Err(PasskeyError::verification(format!(
                "unsupported COSE key (kty {kty}, alg {alg})"
            ))),
        }
    }

    pub fn algorithm(&self) -> i64 {
        match self {
            Self::Es256(_) => ALG_ES256,
            Self::EdDsa(_) => ALG_EDDSA,
            Self::Rs256(_) => ALG_RS256,
        }
    }

    /// Verify `signature` over `message`
    ///
    /// ES256 signatures are DER-encoded; high-S forms are normalized before
    /// verification since authenticators emit both.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            Self::Es256(key) => {
                let sig = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| PasskeyError::verification("malformed ES256 signature"))?;
                let sig = sig.normalize_s().unwrap_or(sig);
                key.verify(message, &sig)
                    .map_err(|_| PasskeyError::verification("signature verification failed"))
            }
            Self::EdDsa(key) => {
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| PasskeyError::verification("malformed Ed25519 signature"))?;
                key.verify_strict(message, &sig)
                    .map_err(|_| PasskeyError::verification("signature verification failed"))
            }
            Self::Rs256(key) => {
                let sig = rsa::pkcs1v15::Signature::try_from(signature)
                    .map_err(|_| PasskeyError::verification("malformed RS256 signature"))?;
                key.verify(message, &sig)
                    .map_err(|_| PasskeyError::verification("signature verification failed"))
            }
        }
    }
}

fn lookup(entries: &[(Value, Value)], label: i128) -> Option<&Value> {
    entries.iter().find_map(|(k, v)| match k {
        Value::Integer(i) if i128::from(*i) == label => Some(v),
        _ => None,
    })
}

fn int_label(entries: &[(Value, Value)], label: i128) -> Result<i128> {
    match lookup(entries, label) {
        Some(Value::Integer(i)) => Ok(i128::from(*i)),
        _ => Err(PasskeyError::verification(format!(
            "COSE key label {label} missing or not an integer"
        ))),
    }
}

fn expect_curve(entries: &[(Value, Value)], crv: i128) -> Result<()> {
    let found = int_label(entries, LABEL_CRV)?;
    if found != crv {
        return Err(PasskeyError::verification(format!(
            "unexpected COSE curve {found}"
        )));
    }
    Ok(())
}

fn any_bytes_label(entries: &[(Value, Value)], label: i128) -> Result<&[u8]> {
    match lookup(entries, label) {
        Some(Value::Bytes(b)) if !b.is_empty() => Ok(b),
        _ => Err(PasskeyError::verification(format!(
            "COSE key label {label} missing or not a byte string"
        ))),
    }
}

fn bytes_label(entries: &[(Value, Value)], label: i128, len: usize) -> Result<&[u8]> {
    match lookup(entries, label) {
        Some(Value::Bytes(b)) if b.len() == len => Ok(b),
        _ => Err(PasskeyError::verification(format!(
            "COSE key label {label} must be {len} bytes"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ed25519_cose_key, es256_cose_key, rs256_cose_key, test_rsa_key};
    use p256::ecdsa::signature::{SignatureEncoding as _, Signer as _};

    #[test]
    fn test_es256_sign_and_verify() {
        let signing = p256::ecdsa::SigningKey::from_slice(&[7u8; 32]).unwrap();
        let key = CosePublicKey::from_cose(&es256_cose_key(&signing)).unwrap();
        assert_eq!(key.algorithm(), ALG_ES256);

        let sig: p256::ecdsa::Signature = signing.sign(b"message");
        let der = sig.to_der();
        assert!(key.verify(b"message", der.as_bytes()).is_ok());
        assert!(key.verify(b"other", der.as_bytes()).is_err());
    }

    #[test]
    fn test_ed25519_sign_and_verify() {
        let signing = ed25519_dalek::SigningKey::from_bytes(&[9u8; 32]);
        let key = CosePublicKey::from_cose(&ed25519_cose_key(&signing)).unwrap();
        assert_eq!(key.algorithm(), ALG_EDDSA);

        let sig = signing.sign(b"message");
        assert!(key.verify(b"message", &sig.to_bytes()).is_ok());
        assert!(key.verify(b"message", &[0u8; 64]).is_err());
        assert!(key.verify(b"message", &[0u8; 10]).is_err());
    }

    #[test]
    fn test_rs256_sign_and_verify() {
        let private = test_rsa_key();
        let key = CosePublicKey::from_cose(&rs256_cose_key(&private)).unwrap();
        assert_eq!(key.algorithm(), ALG_RS256);

        let signing = rsa::pkcs1v15::SigningKey::<Sha256>::new(private);
        let sig = signing.sign(b"message").to_vec();
        assert!(key.verify(b"message", &sig).is_ok());
        assert!(key.verify(b"other", &sig).is_err());
        assert!(key.verify(b"message", &[0u8; 16]).is_err());
    }

    #[test]
    fn test_short_rsa_modulus_rejected() {
        let map = Value::Map(vec![
            (Value::Integer(1i64.into()), Value::Integer(3i64.into())),
            (Value::Integer(3i64.into()), Value::Integer((-257i64).into())),
            (Value::Integer((-1i64).into()), Value::Bytes(vec![1; 128])),
            (Value::Integer((-2i64).into()), Value::Bytes(vec![1, 0, 1])),
        ]);
        let mut bytes = Vec::new();
        ciborium::into_writer(&map, &mut bytes).unwrap();
        assert!(CosePublicKey::from_cose(&bytes).is_err());
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        // PS256 over an RSA key
        let map = Value::Map(vec![
            (Value::Integer(1i64.into()), Value::Integer(3i64.into())),
            (Value::Integer(3i64.into()), Value::Integer((-37i64).into())),
            (Value::Integer((-1i64).into()), Value::Bytes(vec![0xC1; 256])),
            (Value::Integer((-2i64).into()), Value::Bytes(vec![1, 0, 1])),
        ]);
        let mut bytes = Vec::new();
        ciborium::into_writer(&map, &mut bytes).unwrap();
        assert!(CosePublicKey::from_cose(&bytes).is_err());
    }

    #[test]
    fn test_point_off_curve_rejected() {
        let map = Value::Map(vec![
            (Value::Integer(1i64.into()), Value::Integer(2i64.into())),
            (Value::Integer(3i64.into()), Value::Integer((-7i64).into())),
            (Value::Integer((-1i64).into()), Value::Integer(1i64.into())),
            (Value::Integer((-2i64).into()), Value::Bytes(vec![1; 32])),
            (Value::Integer((-3i64).into()), Value::Bytes(vec![2; 32])),
        ]);
        let mut bytes = Vec::new();
        ciborium::into_writer(&map, &mut bytes).unwrap();
        assert!(CosePublicKey::from_cose(&bytes).is_err());
    }

    #[test]
    fn test_not_a_map() {
        let mut bytes = Vec::new();
        ciborium::into_writer(&Value::Text("key".into()), &mut bytes).unwrap();
        assert!(CosePublicKey::from_cose(&bytes).is_err());
        assert!(CosePublicKey::from_cose(&[0xff]).is_err());
    }
}
