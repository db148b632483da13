//! Keychain integration for the vault secret.
//!
//! This module provides cross-platform keychain access using the `keyring` crate:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (via D-Bus)
//! - iOS: iOS Keychain (when compiled for iOS)
//!
//! An in-memory backend is provided for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Default service name used for keychain entries.
pub const DEFAULT_SERVICE: &str = "docvault";

/// Default key under which the vault secret is stored.
pub const DEFAULT_KEY: &str = "master_password";

/// Errors that can occur during keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// The requested key was not found in the keychain.
    #[error("Key not found in keychain: {0}")]
    NotFound(String),

    /// Access to the keychain was denied.
    #[error("Keychain access denied: {0}")]
    AccessDenied(String),

    /// The keychain service is unavailable.
    #[error("Keychain service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The stored value could not be encoded or decoded.
    #[error("Key encoding error: {0}")]
    EncodingError(String),

    /// A platform-specific keychain error occurred.
    #[error("Keychain error: {0}")]
    PlatformError(String),
}

/// Result type for keychain operations.
pub type KeychainResult<T> = Result<T, KeychainError>;

/// Opaque secure key-value service.
pub trait KeychainBackend: Send + Sync {
    /// Retrieve a secret. Missing entries are `KeychainError::NotFound`.
    fn get_secret(&self, service: &str, key: &str) -> KeychainResult<String>;

    /// Store a secret, replacing any existing value.
    fn set_secret(&self, service: &str, key: &str, value: &str) -> KeychainResult<()>;

    /// Delete a secret. Missing entries are `KeychainError::NotFound`.
    fn delete_secret(&self, service: &str, key: &str) -> KeychainResult<()>;
}

impl<B: KeychainBackend + ?Sized> KeychainBackend for Arc<B> {
    fn get_secret(&self, service: &str, key: &str) -> KeychainResult<String> {
        (**self).get_secret(service, key)
    }

    fn set_secret(&self, service: &str, key: &str, value: &str) -> KeychainResult<()> {
        (**self).set_secret(service, key, value)
    }

    fn delete_secret(&self, service: &str, key: &str) -> KeychainResult<()> {
        (**self).delete_secret(service, key)
    }
}

/// Keychain backend using the operating system's credential store.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemKeychain;

impl SystemKeychain {
    fn entry(service: &str, key: &str) -> KeychainResult<keyring::Entry> {
        keyring::Entry::new(service, key).map_err(|e| KeychainError::PlatformError(e.to_string()))
    }
}

fn map_keyring_error(key: &str, e: keyring::Error) -> KeychainError {
    match e {
        keyring::Error::NoEntry => KeychainError::NotFound(key.to_string()),
        keyring::Error::Ambiguous(_) => {
            KeychainError::PlatformError("Ambiguous keychain entry".to_string())
        }
        keyring::Error::TooLong(_, _) => KeychainError::EncodingError("Value too long".to_string()),
        keyring::Error::Invalid(_, _) => {
            KeychainError::EncodingError("Invalid key format".to_string())
        }
        keyring::Error::BadEncoding(_) => {
            KeychainError::EncodingError("Stored value is not UTF-8".to_string())
        }
        keyring::Error::NoStorageAccess(_) => {
            KeychainError::AccessDenied("No storage access".to_string())
        }
        keyring::Error::PlatformFailure(_) => {
            KeychainError::ServiceUnavailable("Platform failure".to_string())
        }
        _ => KeychainError::PlatformError(e.to_string()),
    }
}

impl KeychainBackend for SystemKeychain {
    fn get_secret(&self, service: &str, key: &str) -> KeychainResult<String> {
        Self::entry(service, key)?
            .get_password()
            .map_err(|e| map_keyring_error(key, e))
    }

    fn set_secret(&self, service: &str, key: &str, value: &str) -> KeychainResult<()> {
        Self::entry(service, key)?
            .set_password(value)
            .map_err(|e| map_keyring_error(key, e))
    }

    fn delete_secret(&self, service: &str, key: &str) -> KeychainResult<()> {
        Self::entry(service, key)?
            .delete_credential()
            .map_err(|e| map_keyring_error(key, e))
    }
}

/// In-process keychain. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKeychain {
    storage: Mutex<HashMap<String, String>>,
}

impl MemoryKeychain {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_key(service: &str, key: &str) -> String {
        format!("{}:{}", service, key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeychainBackend for MemoryKeychain {
    fn get_secret(&self, service: &str, key: &str) -> KeychainResult<String> {
        self.lock()
            .get(&Self::make_key(service, key))
            .cloned()
            .ok_or_else(|| KeychainError::NotFound(key.to_string()))
    }

    fn set_secret(&self, service: &str, key: &str, value: &str) -> KeychainResult<()> {
        self.lock()
            .insert(Self::make_key(service, key), value.to_string());
        Ok(())
    }

    fn delete_secret(&self, service: &str, key: &str) -> KeychainResult<()> {
        match self.lock().remove(&Self::make_key(service, key)) {
            Some(_) => Ok(()),
            None => Err(KeychainError::NotFound(key.to_string())),
        }
    }
}

/// A single named slot in a keychain backend.
pub struct KeychainSlot<B: KeychainBackend> {
    backend: B,
    service: String,
    key: String,
}

impl<B: KeychainBackend> KeychainSlot<B> {
    /// Slot under the default service and key.
    pub fn new(backend: B) -> Self {
        Self::with_names(backend, DEFAULT_SERVICE, DEFAULT_KEY)
    }

    /// Slot under custom service and key names.
    pub fn with_names(backend: B, service: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            backend,
            service: service.into(),
            key: key.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored value, mapping a missing entry to `None`.
    pub fn get(&self) -> KeychainResult<Option<String>> {
        match self.backend.get_secret(&self.service, &self.key) {
            Ok(value) => Ok(Some(value)),
            Err(KeychainError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store a value, overwriting any previous one.
    pub fn set(&self, value: &str) -> KeychainResult<()> {
        self.backend.set_secret(&self.service, &self.key, value)
    }

    /// Remove the stored value. Returns whether anything was removed.
    pub fn delete(&self) -> KeychainResult<bool> {
        match self.backend.delete_secret(&self.service, &self.key) {
            Ok(()) => Ok(true),
            Err(KeychainError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether a value exists. Backend failures read as "not set".
    pub fn exists(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }
}
