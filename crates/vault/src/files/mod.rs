//! File manager module for the documents root.
//!
//! This module provides:
//! - Directory listing with boundary validation and client-side sorting
//! - Entry creation (folders, text files, images), renaming and deletion
//! - Read access for viewing files
//!
//! # Security
//!
//! All paths are resolved against the documents root and canonicalized.
//! Anything that escapes the root, directly or through a symlink, is rejected.

pub mod browser;
pub mod mutation;

pub use browser::{sort_entries, BrowserError, DirectoryBrowser};
pub use mutation::{EntryMutator, MutationError, MutationResult};
