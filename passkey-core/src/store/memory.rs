//! In-memory credential storage
//!
//! Each `DashMap` shard lock makes the entry-level check-then-write atomic,
//! which gives the same create-once and compare-and-swap guarantees as the
//! database backend within a single process.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{CredentialStore, StoreError};
use crate::credential::Credential;

/// Thread-safe in-memory credential storage
#[derive(Default)]
pub struct MemoryCredentialStore {
    /// Registered credentials (credential_id -> credential)
    credentials: DashMap<String, Credential>,
}

impl MemoryCredentialStore {
    /// Create a new storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, credential: &Credential) -> Result<(), StoreError> {
        match self.credentials.entry(credential.credential_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(
                credential.credential_id.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(credential.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, credential_id: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .credentials
            .get(credential_id)
            .map(|entry| entry.value().clone()))
    }

    async fn update_counter(
        &self,
        credential_id: &str,
        new_counter: u32,
        expected_counter: u32,
    ) -> Result<(), StoreError> {
        match self.credentials.get_mut(credential_id) {
            Some(mut entry) if entry.counter == expected_counter => {
                entry.counter = new_counter;
                entry.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(StoreError::ConcurrentModification(
                credential_id.to_string(),
            )),
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("credentials", &self.credentials.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credential::{DeviceType, NewCredential};

    fn credential(id: &str, counter: u32) -> Credential {
        Credential::create(NewCredential {
            credential_id: id.to_string(),
            public_key: "cGs".to_string(),
            counter,
            transports: vec!["usb".to_string()],
            backed_up: false,
            device_type: DeviceType::SingleDevice,
        })
    }

    #[tokio::test]
    async fn test_create_is_once_only() {
        let store = MemoryCredentialStore::new();
        let first = credential("cred-1", 3);
        store.create(&first).await.unwrap();

        let mut duplicate = credential("cred-1", 99);
        duplicate.public_key = "b3RoZXI".to_string();
        let err = store.create(&duplicate).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == "cred-1"));

        let stored = store.get("cred-1").await.unwrap().unwrap();
        assert_eq!(stored, first);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryCredentialStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_counter_compare_and_swap() {
        let store = MemoryCredentialStore::new();
        store.create(&credential("cred-1", 5)).await.unwrap();

        store.update_counter("cred-1", 6, 5).await.unwrap();
        let stored = store.get("cred-1").await.unwrap().unwrap();
        assert_eq!(stored.counter, 6);
        assert!(stored.updated_at >= stored.created_at);

        // Stale expectation
        let err = store.update_counter("cred-1", 7, 5).await.unwrap_err();
        assert!(matches!(err, StoreError::ConcurrentModification(_)));
        assert_eq!(store.get("cred-1").await.unwrap().unwrap().counter, 6);
    }

    #[tokio::test]
    async fn test_update_counter_missing_record() {
        let store = MemoryCredentialStore::new();
        let err = store.update_counter("ghost", 1, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::ConcurrentModification(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_single_winner() {
        let store = Arc::new(MemoryCredentialStore::new());
        store.create(&credential("cred-1", 10)).await.unwrap();

        let mut handles = Vec::new();
        for new_counter in 11..=18 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.update_counter("cred-1", new_counter, 10).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => winners += 1,
                Err(StoreError::ConcurrentModification(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(winners, 1);
        let counter = store.get("cred-1").await.unwrap().unwrap().counter;
        assert!((11..=18).contains(&counter));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_single_winner() {
        let store = Arc::new(MemoryCredentialStore::new());

        let mut handles = Vec::new();
        for counter in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(&credential("dup", counter)).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.len(), 1);
    }
}
