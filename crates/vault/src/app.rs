//! Wiring of the vault components.
//!
//! [`Vault`] owns one credential gate, one entry mutator rooted at the
//! documents directory, and one preference bridge. Both front ends (the
//! one-shot CLI commands and the interactive shell) go through it.

use std::path::Path;

use anyhow::{Context, Result};
use model::PasswordPolicy;
use storage::KeychainBackend;

use crate::auth::{AuthError, AuthResult, CredentialGate};
use crate::config::Config;
use crate::files::{BrowserError, DirectoryBrowser, EntryMutator};
use crate::preferences::{PreferenceBridge, PreferenceStore};
use crate::view::DirectoryView;

/// The assembled vault.
pub struct Vault<B: KeychainBackend, S: PreferenceStore> {
    gate: CredentialGate<B>,
    mutator: EntryMutator,
    preferences: PreferenceBridge<S>,
}

impl<B: KeychainBackend, S: PreferenceStore> Vault<B, S> {
    pub fn new(gate: CredentialGate<B>, mutator: EntryMutator, preferences: PreferenceBridge<S>) -> Self {
        Self {
            gate,
            mutator,
            preferences,
        }
    }

    /// Build a vault from configuration, creating the documents root if needed.
    pub fn from_config(config: &Config, backend: B, store: S) -> Result<Self> {
        let browser = DirectoryBrowser::open_or_create(&config.vault.documents_dir)
            .with_context(|| {
                format!(
                    "Failed to open documents directory {:?}",
                    config.vault.documents_dir
                )
            })?;

        let gate = CredentialGate::with_names(
            backend,
            config.security.keychain_service.clone(),
            config.security.keychain_key.clone(),
        )
        .with_policy(PasswordPolicy::with_min_length(
            config.security.min_password_length,
        ));

        let preferences = PreferenceBridge::new(store);
        if let Err(e) = preferences.ensure_defaults() {
            tracing::warn!("Failed to write default preferences: {}", e);
        }

        tracing::debug!("Vault ready at {:?}", browser.root());
        Ok(Self::new(gate, EntryMutator::new(browser), preferences))
    }

    pub fn gate(&self) -> &CredentialGate<B> {
        &self.gate
    }

    pub fn mutator(&self) -> &EntryMutator {
        &self.mutator
    }

    pub fn preferences(&self) -> &PreferenceBridge<S> {
        &self.preferences
    }

    /// Check `password` against the stored secret.
    pub fn unlock(&self, password: &str) -> AuthResult<()> {
        if !self.gate.is_set() {
            return Err(AuthError::NotInitialized);
        }
        if self.gate.is_valid(password) {
            Ok(())
        } else {
            Err(AuthError::WrongPassword)
        }
    }

    /// Replace the password after checking the current one.
    ///
    /// The new secret overwrites the old one in a single keychain write, so a
    /// failed write leaves the current password in place.
    pub fn change_password(&self, current: &str, new_password: &str) -> AuthResult<()> {
        self.unlock(current)?;
        self.gate.save(new_password)?;
        tracing::info!("Vault password changed");
        Ok(())
    }

    /// Open a listing of `directory` subscribed to preference changes.
    pub fn open_view(&self, directory: &Path) -> Result<DirectoryView, BrowserError> {
        DirectoryView::open(
            self.mutator.clone(),
            directory,
            self.preferences.snapshot(),
            self.preferences.subscribe(),
        )
    }
}
