use std::{collections::HashMap, sync::Mutex};

use alloy_primitives::Address;
use auto_impl::auto_impl;

/// Errors reported by a [`CredentialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialStoreError {
    /// The backing store returned a status the caller does not handle.
    #[error("unexpected credential store status {0}")]
    UnexpectedStatus(i32),
    /// No item exists under the requested key.
    #[error("credential not found")]
    DataNotFound,
    /// The stored item could not be interpreted.
    #[error("invalid credential data")]
    InvalidData,
}

/// An opaque byte store keyed by `(account, service)`.
///
/// Implementations decide where bytes live and who may read them. Callers only rely on an
/// operation either succeeding or failing with a [`CredentialStoreError`]. Saving under an
/// existing key replaces the item.
#[auto_impl(&, Box, Arc)]
pub trait CredentialStore {
    /// Stores `data` under `(account, service)`.
    fn save(&self, data: &[u8], account: &str, service: &str) -> Result<(), CredentialStoreError>;

    /// Reads the item stored under `(account, service)`.
    fn read(&self, account: &str, service: &str) -> Result<Vec<u8>, CredentialStoreError>;

    /// Deletes the item stored under `(account, service)`.
    fn delete(&self, account: &str, service: &str) -> Result<(), CredentialStoreError>;
}

/// The store account name under which items of an EOA are kept.
pub fn store_account(address: &Address) -> String {
    address.to_checksum(None)
}

/// An in-process [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    items: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryCredentialStore {
    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.lock().map_or(0, |items| items.len())
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, data: &[u8], account: &str, service: &str) -> Result<(), CredentialStoreError> {
        let mut items = self.items.lock().map_err(|_| CredentialStoreError::UnexpectedStatus(-1))?;
        items.insert((account.to_string(), service.to_string()), data.to_vec());
        Ok(())
    }

    fn read(&self, account: &str, service: &str) -> Result<Vec<u8>, CredentialStoreError> {
        let items = self.items.lock().map_err(|_| CredentialStoreError::UnexpectedStatus(-1))?;
        items
            .get(&(account.to_string(), service.to_string()))
            .cloned()
            .ok_or(CredentialStoreError::DataNotFound)
    }

    fn delete(&self, account: &str, service: &str) -> Result<(), CredentialStoreError> {
        let mut items = self.items.lock().map_err(|_| CredentialStoreError::UnexpectedStatus(-1))?;
        items
            .remove(&(account.to_string(), service.to_string()))
            .map(|_| ())
            .ok_or(CredentialStoreError::DataNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryCredentialStore::default();
        store.save(b"secret", "alice", "svc").unwrap();
        store.save(b"other", "alice", "svc2").unwrap();
        assert_eq!(store.read("alice", "svc").unwrap(), b"secret");
        assert_eq!(store.len(), 2);

        store.save(b"replaced", "alice", "svc").unwrap();
        assert_eq!(store.read("alice", "svc").unwrap(), b"replaced");

        store.delete("alice", "svc").unwrap();
        assert_eq!(store.read("alice", "svc"), Err(CredentialStoreError::DataNotFound));
        assert_eq!(store.delete("alice", "svc"), Err(CredentialStoreError::DataNotFound));
    }

    #[test]
    fn test_store_account_is_checksummed() {
        let address: Address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        assert_eq!(store_account(&address), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }
}
