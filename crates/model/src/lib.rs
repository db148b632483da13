//! # DocVault Model Library
//!
//! Shared value types for the DocVault document manager.
//!
//! ## Overview
//!
//! This crate holds the plain data that flows between the storage backends,
//! the vault services and the front end:
//!
//! - **Directory entries**: one file-system child with its kind and optional size
//! - **Listing preferences**: sort direction and size display, passed explicitly
//!   into every listing call
//! - **Input policies**: password and entry-name validation shared by every
//!   entry point
//! - **Size formatting**: human-readable byte counts for listings
//!
//! ## Example Usage
//!
//! ```rust
//! use model::{format_size, ListingPreferences, PasswordPolicy, PreferenceKey};
//!
//! let prefs = ListingPreferences::default();
//! assert!(!prefs.sort_descending);
//! assert!(prefs.show_size);
//! assert_eq!(PreferenceKey::Sort.as_str(), "sort");
//!
//! assert!(PasswordPolicy::default().check("abc").is_err());
//! assert_eq!(format_size(1_500_000), "1.5 MB");
//! ```
//!
//! ## Modules
//!
//! - [`entry`]: Directory entry types
//! - [`preferences`]: Listing preferences and their persisted keys
//! - [`policy`]: Password and name validation
//! - [`size`]: Byte-count formatting
//! - [`error`]: Validation error type

pub mod entry;
pub mod error;
pub mod policy;
pub mod preferences;
pub mod size;

pub use entry::{DirectoryEntry, EntryKind};
pub use error::ValidationError;
pub use policy::{validate_entry_name, PasswordPolicy, MIN_PASSWORD_LENGTH};
pub use preferences::{ListingPreferences, PreferenceKey, SortOrder};
pub use size::format_size;
