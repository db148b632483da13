//! Credential gate: one secret under a fixed keychain key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use model::PasswordPolicy;
use rand::RngCore;
use sha2::{Digest, Sha256};
use storage::{KeychainBackend, KeychainSlot};

use super::{AuthError, AuthResult};

/// Prefix identifying the stored digest format.
const SCHEME: &str = "sha256";

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Guards the vault behind a single stored password.
///
/// States: unset (no secret under the key) and set. Whether the user has
/// signed in during this session is tracked by [`LoginFlow`](super::LoginFlow),
/// not here.
pub struct CredentialGate<B: KeychainBackend> {
    slot: KeychainSlot<B>,
    policy: PasswordPolicy,
}

impl<B: KeychainBackend> CredentialGate<B> {
    /// Gate using the default keychain service and key.
    pub fn new(backend: B) -> Self {
        Self {
            slot: KeychainSlot::new(backend),
            policy: PasswordPolicy::default(),
        }
    }

    /// Gate using custom keychain service and key names.
    pub fn with_names(backend: B, service: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            slot: KeychainSlot::with_names(backend, service, key),
            policy: PasswordPolicy::default(),
        }
    }

    /// Replace the password policy.
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Whether a secret is stored.
    pub fn is_set(&self) -> bool {
        self.slot.exists()
    }

    /// Store `candidate` as the vault secret, replacing any previous one.
    pub fn save(&self, candidate: &str) -> AuthResult<()> {
        self.policy.check(candidate)?;

        let stored = hash_secret(candidate);
        self.slot.set(&stored).map_err(|e| {
            tracing::error!("Failed to store vault password: {}", e);
            AuthError::Storage(e)
        })?;

        tracing::info!(
            "Vault password saved under {}/{}",
            self.slot.service(),
            self.slot.key()
        );
        Ok(())
    }

    /// Whether a secret is stored and `candidate` matches it exactly.
    ///
    /// Blank or shorter-than-floor candidates are rejected without touching
    /// the keychain. A raised policy minimum does not lock out a password
    /// saved before it was raised.
    pub fn is_valid(&self, candidate: &str) -> bool {
        if self.policy.check_sign_in(candidate).is_err() {
            return false;
        }

        let stored = match self.slot.get() {
            Ok(Some(stored)) => stored,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Failed to read vault password: {}", e);
                return false;
            }
        };

        match verify_secret(candidate, &stored) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }

    /// Delete the stored secret.
    ///
    /// Returns whether a secret was present. Storage failures are logged and
    /// returned; the caller decides whether they block the flow.
    pub fn remove(&self) -> AuthResult<bool> {
        match self.slot.delete() {
            Ok(removed) => {
                if removed {
                    tracing::info!("Vault password removed");
                }
                Ok(removed)
            }
            Err(e) => {
                tracing::warn!("Failed to remove vault password: {}", e);
                Err(AuthError::Storage(e))
            }
        }
    }
}

/// Produce the stored form `sha256$<salt>$<digest>` for a password.
fn hash_secret(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = digest(&salt, password);
    format!(
        "{}${}${}",
        SCHEME,
        STANDARD.encode(salt),
        STANDARD.encode(digest)
    )
}

/// Check a password against a stored `sha256$<salt>$<digest>` value.
fn verify_secret(password: &str, stored: &str) -> AuthResult<bool> {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::CorruptSecret);
    };

    let salt = STANDARD.decode(salt).map_err(|_| AuthError::CorruptSecret)?;
    let expected = STANDARD
        .decode(expected)
        .map_err(|_| AuthError::CorruptSecret)?;

    Ok(digest(&salt, password).as_slice() == expected.as_slice())
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ValidationError;
    use std::sync::Arc;
    use storage::{KeychainError, KeychainResult, MemoryKeychain};

    fn create_test_gate() -> CredentialGate<MemoryKeychain> {
        CredentialGate::new(MemoryKeychain::new())
    }

    /// Backend whose every call fails.
    struct BrokenKeychain;

    impl KeychainBackend for BrokenKeychain {
        fn get_secret(&self, _: &str, _: &str) -> KeychainResult<String> {
            Err(KeychainError::ServiceUnavailable("offline".to_string()))
        }

        fn set_secret(&self, _: &str, _: &str, _: &str) -> KeychainResult<()> {
            Err(KeychainError::ServiceUnavailable("offline".to_string()))
        }

        fn delete_secret(&self, _: &str, _: &str) -> KeychainResult<()> {
            Err(KeychainError::AccessDenied("locked".to_string()))
        }
    }

    #[test]
    fn test_starts_unset() {
        let gate = create_test_gate();
        assert!(!gate.is_set());
        assert!(!gate.is_valid("pass1"));
    }

    #[test]
    fn test_save_then_valid() {
        let gate = create_test_gate();
        gate.save("pass1").unwrap();

        assert!(gate.is_set());
        assert!(gate.is_valid("pass1"));
    }

    #[test]
    fn test_single_character_difference_is_invalid() {
        let gate = create_test_gate();
        gate.save("pass1").unwrap();

        for wrong in ["pass2", "Pass1", "pass1 ", "pass", "pass11", "xass1"] {
            assert!(!gate.is_valid(wrong), "{wrong:?} must not validate");
        }
    }

    #[test]
    fn test_short_password_rejected_before_storage() {
        let gate = CredentialGate::new(BrokenKeychain);
        // A broken backend would turn any storage call into a Storage error.
        assert!(matches!(
            gate.save("abc"),
            Err(AuthError::Validation(ValidationError::TooShort { .. }))
        ));
        assert!(matches!(
            gate.save("   "),
            Err(AuthError::Validation(ValidationError::Required))
        ));
    }

    #[test]
    fn test_storage_failure_surfaces() {
        let gate = CredentialGate::new(BrokenKeychain);
        assert!(matches!(gate.save("pass1"), Err(AuthError::Storage(_))));
        assert!(!gate.is_valid("pass1"));
        assert!(!gate.is_set());
        assert!(matches!(gate.remove(), Err(AuthError::Storage(_))));
    }

    #[test]
    fn test_remove() {
        let gate = create_test_gate();
        gate.save("pass1").unwrap();

        assert!(gate.remove().unwrap());
        assert!(!gate.is_set());
        assert!(!gate.is_valid("pass1"));
        assert!(!gate.remove().unwrap());
    }

    #[test]
    fn test_secret_not_stored_in_plain_text() {
        let backend = Arc::new(MemoryKeychain::new());
        let gate = CredentialGate::new(backend.clone());
        gate.save("pass1").unwrap();

        let stored = backend
            .get_secret(storage::DEFAULT_SERVICE, storage::DEFAULT_KEY)
            .unwrap();
        assert!(stored.starts_with("sha256$"));
        assert!(!stored.contains("pass1"));
    }

    #[test]
    fn test_salts_differ_between_saves() {
        assert_ne!(hash_secret("pass1"), hash_secret("pass1"));
    }

    #[test]
    fn test_corrupt_secret_never_validates() {
        let backend = Arc::new(MemoryKeychain::new());
        backend
            .set_secret(storage::DEFAULT_SERVICE, storage::DEFAULT_KEY, "pass1")
            .unwrap();

        let gate = CredentialGate::new(backend);
        assert!(gate.is_set());
        assert!(!gate.is_valid("pass1"));
        assert!(matches!(
            verify_secret("pass1", "sha256$!!$??"),
            Err(AuthError::CorruptSecret)
        ));
    }

    #[test]
    fn test_custom_policy() {
        let gate = create_test_gate().with_policy(PasswordPolicy::with_min_length(8));
        assert!(gate.save("pass1").is_err());
        gate.save("longpass").unwrap();
        assert!(gate.is_valid("longpass"));
        assert_eq!(gate.policy().min_length(), 8);
    }

    #[test]
    fn test_raised_minimum_keeps_existing_password() {
        let backend = Arc::new(MemoryKeychain::new());
        CredentialGate::new(backend.clone()).save("pass1").unwrap();

        let gate = CredentialGate::new(backend).with_policy(PasswordPolicy::with_min_length(8));
        assert!(gate.is_valid("pass1"));
        assert!(!gate.is_valid("pass2"));
        assert!(!gate.is_valid(""));
    }

    #[test]
    fn test_restart_on_same_backend() {
        let backend = Arc::new(MemoryKeychain::new());
        CredentialGate::new(backend.clone()).save("pass1").unwrap();

        let gate = CredentialGate::new(backend);
        assert!(gate.is_set());
        assert!(gate.is_valid("pass1"));
        assert!(!gate.is_valid("pass2"));
    }
}
