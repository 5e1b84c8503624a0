//! Personal access token storage backed by the OS keychain.
//!
//! Tokens are kept per organization under the key `{organization}/pat`:
//!
//! - **macOS**: Keychain Services
//! - **Windows**: Credential Manager
//! - **Linux**: Secret Service (GNOME Keyring / KWallet)
//!
//! ```ignore
//! use azdo_storage::{pat_key, CredentialStore, KeychainStore};
//!
//! let store = KeychainStore::new();
//! store.store(&pat_key("contoso"), "my-pat")?;
//! assert_eq!(store.get(&pat_key("contoso"))?, Some("my-pat".to_string()));
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use azdo_core::{Error, Result};
use keyring::Entry;
use tracing::{debug, warn};

/// Service name of the keychain entries.
const SERVICE_NAME: &str = "azdo-mcp";

/// Secret storage backend.
pub trait CredentialStore: Send + Sync {
    fn store(&self, key: &str, value: &str) -> Result<()>;

    /// `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Succeeds when nothing is stored under `key`.
    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }
}

/// Key of an organization's personal access token.
pub fn pat_key(organization: &str) -> String {
    format!("{}/pat", organization.trim().to_lowercase())
}

// =============================================================================
// KeychainStore
// =============================================================================

/// Store backed by the platform keychain.
#[derive(Debug)]
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    pub fn new() -> Self {
        Self::with_service_name(SERVICE_NAME)
    }

    /// Store under a different keychain service (keeps test entries apart).
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).map_err(|e| {
            Error::Storage(format!("Failed to open keychain entry '{}': {}", key, e))
        })
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeychainStore {
    fn store(&self, key: &str, value: &str) -> Result<()> {
        debug!(key = key, "Saving token to keychain");
        self.entry(key)?
            .set_password(value)
            .map_err(|e| Error::Storage(format!("Failed to save '{}': {}", key, e)))
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => {
                debug!(key = key, "No keychain entry");
                Ok(None)
            }
            Err(e) => {
                warn!(key = key, error = %e, "Keychain read failed");
                Err(Error::Storage(format!("Failed to read '{}': {}", key, e)))
            }
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        debug!(key = key, "Removing token from keychain");
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Storage(format!("Failed to remove '{}': {}", key, e))),
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// Process-local store, used in tests and when no keychain is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            secrets: RwLock::new(credentials.into_iter().collect()),
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> Error {
    Error::Storage(format!("Lock poisoned: {}", e))
}

impl CredentialStore for MemoryStore {
    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.secrets
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.secrets.read().map_err(poisoned)?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.secrets.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
