//! Password gate for the vault.
//!
//! - [`gate`]: stores and checks the single vault secret
//! - [`flow`]: the create → confirm → sign-in state machine driven by the front end
//!
//! Passwords are never stored as typed. The keychain holds a salted SHA-256
//! digest, and validation recomputes it.

pub mod flow;
pub mod gate;

use model::ValidationError;
use storage::KeychainError;
use thiserror::Error;

pub use flow::{LoginFlow, LoginMode, LoginOutcome};
pub use gate::CredentialGate;

/// Errors returned by credential operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed the password policy.
    #[error("invalid password: {0}")]
    Validation(#[from] ValidationError),

    /// The keychain could not be read or written.
    #[error("credential storage failed: {0}")]
    Storage(#[from] KeychainError),

    /// No password has been created yet.
    #[error("vault is not initialized; run `docvault init` first")]
    NotInitialized,

    /// The entered password does not match the stored one.
    #[error("Password is wrong, try again")]
    WrongPassword,

    /// The stored value is not in a recognised format.
    #[error("stored credential is corrupt")]
    CorruptSecret,
}

/// Result type for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;
