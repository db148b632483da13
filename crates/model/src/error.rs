//! Error types for the model crate.

use thiserror::Error;

/// Input rejected before it reaches any storage or file-system call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Input was empty or only whitespace.
    #[error("a value is required")]
    Required,

    /// Input is shorter than the policy allows.
    #[error("too short: at least {min} characters required, got {len}")]
    TooShort {
        /// Minimum accepted length.
        min: usize,
        /// Actual length in characters.
        len: usize,
    },

    /// Name contains a path separator.
    #[error("name must not contain a path separator: {0}")]
    ContainsSeparator(String),

    /// Name is `.` or `..`.
    #[error("reserved name: {0}")]
    Reserved(String),
}
