//! Password and entry-name validation.
//!
//! Every front-end path runs input through these checks before any keychain
//! or file-system call is made.

use crate::error::ValidationError;

/// Shortest password accepted by default.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Length policy for the vault password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl PasswordPolicy {
    /// Policy with a custom minimum. Values below the default are raised to it.
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length: min_length.max(MIN_PASSWORD_LENGTH),
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Check a candidate password.
    ///
    /// Length is counted in characters, not bytes.
    pub fn check(&self, candidate: &str) -> Result<(), ValidationError> {
        if candidate.trim().is_empty() {
            return Err(ValidationError::Required);
        }

        let len = candidate.chars().count();
        if len < self.min_length {
            return Err(ValidationError::TooShort {
                min: self.min_length,
                len,
            });
        }

        Ok(())
    }

    /// Check a sign-in attempt.
    ///
    /// Only the default floor applies: a stored password saved under a lower
    /// configured minimum must still be accepted after the minimum is raised.
    pub fn check_sign_in(&self, candidate: &str) -> Result<(), ValidationError> {
        PasswordPolicy::default().check(candidate)
    }
}

/// Validate the name of a file or folder about to be created or renamed.
pub fn validate_entry_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::ContainsSeparator(name.to_string()));
    }
    if name == "." || name == ".." {
        return Err(ValidationError::Reserved(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_ignores_raised_minimum() {
        let policy = PasswordPolicy::with_min_length(8);
        assert!(policy.check("pass1").is_err());
        assert!(policy.check_sign_in("pass1").is_ok());
        assert!(matches!(policy.check_sign_in(" "), Err(ValidationError::Required)));
        assert!(matches!(
            policy.check_sign_in("abc"),
            Err(ValidationError::TooShort { min: 4, len: 3 })
        ));
    }

    #[test]
    fn test_short_candidates_rejected() {
        let policy = PasswordPolicy::default();
        for candidate in ["a", "ab", "abc", "äöü"] {
            assert!(
                matches!(policy.check(candidate), Err(ValidationError::TooShort { min: 4, .. })),
                "{candidate:?} should be too short"
            );
        }
    }

    #[test]
    fn test_empty_and_blank_required() {
        let policy = PasswordPolicy::default();
        assert_eq!(policy.check(""), Err(ValidationError::Required));
        assert_eq!(policy.check("    "), Err(ValidationError::Required));
        assert_eq!(policy.check("\t\n"), Err(ValidationError::Required));
    }

    #[test]
    fn test_accepts_minimum_length() {
        let policy = PasswordPolicy::default();
        assert!(policy.check("abcd").is_ok());
        assert!(policy.check("pass1").is_ok());
        // Multi-byte characters count once each.
        assert!(policy.check("äöüß").is_ok());
    }

    #[test]
    fn test_custom_minimum_never_below_default() {
        assert_eq!(PasswordPolicy::with_min_length(2).min_length(), 4);
        let policy = PasswordPolicy::with_min_length(8);
        assert!(policy.check("1234567").is_err());
        assert!(policy.check("12345678").is_ok());
    }

    #[test]
    fn test_entry_names() {
        assert!(validate_entry_name("notes.txt").is_ok());
        assert!(validate_entry_name("My Folder").is_ok());
        assert_eq!(validate_entry_name(""), Err(ValidationError::Required));
        assert_eq!(validate_entry_name("  "), Err(ValidationError::Required));
        assert!(matches!(
            validate_entry_name("a/b"),
            Err(ValidationError::ContainsSeparator(_))
        ));
        assert!(matches!(validate_entry_name(".."), Err(ValidationError::Reserved(_))));
        assert!(matches!(validate_entry_name("."), Err(ValidationError::Reserved(_))));
    }
}
