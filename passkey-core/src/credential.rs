//! Stored credential record
//!
//! One record per registered authenticator, keyed by its credential ID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a credential is bound to one device or synced across devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceType {
    /// Hardware-bound key (e.g. a security key)
    SingleDevice,
    /// Syncable passkey (e.g. iCloud Keychain, password managers)
    MultiDevice,
}

impl DeviceType {
    /// Derive from the authenticator data backup-eligibility flag
    pub fn from_backup_eligible(eligible: bool) -> Self {
        if eligible {
            Self::MultiDevice
        } else {
            Self::SingleDevice
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleDevice => "singleDevice",
            Self::MultiDevice => "multiDevice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "singleDevice" => Some(Self::SingleDevice),
            "multiDevice" => Some(Self::MultiDevice),
            _ => None,
        }
    }
}

/// A registered passkey credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Primary key, base64url-encoded credential ID
    pub credential_id: String,
    /// base64url-encoded COSE_Key
    pub public_key: String,
    /// Last accepted signature counter
    pub counter: u32,
    /// Transports reported at registration (`usb`, `nfc`, `ble`, `internal`, `hybrid`)
    pub transports: Vec<String>,
    pub backed_up: bool,
    pub device_type: DeviceType,
    /// Random handle required by the protocol, never used for lookup
    pub user_handle: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credential fields produced by a verified registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub credential_id: String,
    pub public_key: String,
    pub counter: u32,
    pub transports: Vec<String>,
    pub backed_up: bool,
    pub device_type: DeviceType,
}

impl Credential {
    /// Build a fresh record with a random user handle
    pub fn create(data: NewCredential) -> Self {
        let now = Utc::now();
        Self {
            credential_id: data.credential_id,
            public_key: data.public_key,
            counter: data.counter,
            transports: data.transports,
            backed_up: data.backed_up,
            device_type: data.device_type,
            user_handle: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }
}
