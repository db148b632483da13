//! Login flow: create → confirm on first run, sign-in afterwards.

use model::ValidationError;
use storage::KeychainBackend;

use super::{AuthError, CredentialGate};

/// Step the login screen is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    /// No password yet; waiting for the first entry.
    CreatePassword,
    /// First entry accepted; waiting for it to be repeated.
    ConfirmPassword,
    /// A password exists; waiting for it to be entered.
    SignIn,
}

impl LoginMode {
    /// Screen title.
    pub fn title(self) -> &'static str {
        match self {
            LoginMode::CreatePassword | LoginMode::ConfirmPassword => "Sign Up",
            LoginMode::SignIn => "Sign In",
        }
    }

    /// Submit button label.
    pub fn action_label(self) -> &'static str {
        match self {
            LoginMode::CreatePassword => "Create password",
            LoginMode::ConfirmPassword => "Confirm password",
            LoginMode::SignIn => "Login",
        }
    }

    /// Input prompt.
    pub fn prompt(self) -> &'static str {
        match self {
            LoginMode::CreatePassword | LoginMode::SignIn => "Enter password",
            LoginMode::ConfirmPassword => "Re-enter password",
        }
    }
}

/// Result of one submission.
#[derive(Debug)]
pub enum LoginOutcome {
    /// First entry stored in memory; confirm it next.
    AwaitingConfirmation,
    /// Access granted.
    Unlocked,
    /// Confirmation did not match; back to the first step.
    Mismatch,
    /// Sign-in entry did not match the stored password.
    WrongPassword,
    /// Entry failed the policy; the step is unchanged.
    Rejected(ValidationError),
    /// Storing the password failed; back to the first step.
    Failed(AuthError),
}

impl LoginOutcome {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, LoginOutcome::Unlocked)
    }

    /// Message shown for outcomes that need the user's attention.
    pub fn error_message(&self) -> Option<String> {
        match self {
            LoginOutcome::Rejected(ValidationError::Required) => {
                Some("Required password".to_string())
            }
            LoginOutcome::Rejected(ValidationError::TooShort { .. }) => {
                Some("Password is too short".to_string())
            }
            LoginOutcome::Rejected(other) => Some(other.to_string()),
            LoginOutcome::Mismatch => Some("Passwords don't match".to_string()),
            LoginOutcome::WrongPassword => Some("Password is wrong, try again".to_string()),
            LoginOutcome::Failed(e) => Some(e.to_string()),
            LoginOutcome::AwaitingConfirmation | LoginOutcome::Unlocked => None,
        }
    }
}

/// The multi-step login state machine.
///
/// The flow does not own the gate; pass the same gate to every call.
#[derive(Debug)]
pub struct LoginFlow {
    mode: LoginMode,
    pending: Option<String>,
}

impl LoginFlow {
    /// Start in sign-in mode if a password exists, otherwise in create mode.
    pub fn new<B: KeychainBackend>(gate: &CredentialGate<B>) -> Self {
        Self {
            mode: Self::initial_mode(gate),
            pending: None,
        }
    }

    fn initial_mode<B: KeychainBackend>(gate: &CredentialGate<B>) -> LoginMode {
        if gate.is_set() {
            LoginMode::SignIn
        } else {
            LoginMode::CreatePassword
        }
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    /// Drop transient input and re-derive the mode from the gate.
    pub fn reset<B: KeychainBackend>(&mut self, gate: &CredentialGate<B>) {
        self.pending = None;
        self.mode = Self::initial_mode(gate);
    }

    /// Handle one submitted entry.
    pub fn submit<B: KeychainBackend>(
        &mut self,
        gate: &CredentialGate<B>,
        entry: &str,
    ) -> LoginOutcome {
        let checked = match self.mode {
            LoginMode::SignIn => gate.policy().check_sign_in(entry),
            _ => gate.policy().check(entry),
        };
        if let Err(e) = checked {
            return LoginOutcome::Rejected(e);
        }

        match self.mode {
            LoginMode::CreatePassword => {
                self.pending = Some(entry.to_string());
                self.mode = LoginMode::ConfirmPassword;
                LoginOutcome::AwaitingConfirmation
            }
            LoginMode::ConfirmPassword => {
                let first = self.pending.take();
                self.mode = LoginMode::CreatePassword;

                if first.as_deref() != Some(entry) {
                    tracing::debug!("Password confirmation mismatch, restarting");
                    return LoginOutcome::Mismatch;
                }

                match gate.save(entry) {
                    Ok(()) => {
                        self.mode = LoginMode::SignIn;
                        LoginOutcome::Unlocked
                    }
                    Err(e) => LoginOutcome::Failed(e),
                }
            }
            LoginMode::SignIn => {
                if gate.is_valid(entry) {
                    tracing::info!("Sign-in succeeded");
                    LoginOutcome::Unlocked
                } else {
                    tracing::info!("Sign-in rejected");
                    LoginOutcome::WrongPassword
                }
            }
        }
    }
}
