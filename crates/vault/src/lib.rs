//! # DocVault Library
//!
//! A password-gated document manager confined to one documents directory.
//!
//! ## Overview
//!
//! - **Credential Gate**: a single vault password, stored as a salted digest
//!   in the platform keychain, with a create → confirm → sign-in flow
//! - **Directory Browsing**: non-recursive listings that never leave the
//!   documents root, sorted and sized per the listing preferences
//! - **Entry Mutation**: create folders, text files and images; rename and
//!   delete entries; every write is atomic and never overwrites
//! - **Preferences**: two persisted flags (sort order, size display) whose
//!   changes are broadcast to every open listing
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Front end (CLI / shell)                   │
//! ├───────────────────────────────────────────────────────────┤
//! │                          Vault                            │
//! │                                                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  Credential  │  │    Entry     │  │   Preference    │  │
//! │  │     Gate     │  │   Mutator    │  │     Bridge      │  │
//! │  └──────┬───────┘  └──────┬───────┘  └───────┬─────────┘  │
//! │         │          ┌──────┴───────┐          │ broadcast  │
//! │         │          │  Directory   │◄─────────┘            │
//! │         │          │   Browser    │   (DirectoryView)     │
//! │         │          └──────────────┘                       │
//! └─────────┼─────────────────────────────────────────────────┘
//!       keychain          file system          SQLite
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use storage::{Database, SystemKeychain};
//! use vault::{Config, Vault};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let store = Database::open(config.preferences_db_path())?;
//!     let vault = Vault::from_config(&config, SystemKeychain, store)?;
//!
//!     vault.unlock("correct horse")?;
//!     let view = vault.open_view(Path::new(""))?;
//!     for row in view.rows() {
//!         println!("{}", row);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`auth`]: Credential gate and login flow
//! - [`files`]: Directory browsing and entry mutation
//! - [`preferences`]: Persisted listing preferences and change events
//! - [`view`]: An open directory listing
//! - [`app`]: Component wiring
//! - [`shell`]: Interactive front end

pub mod app;
pub mod auth;
pub mod config;
pub mod files;
pub mod preferences;
pub mod shell;
pub mod view;

// Re-export model for convenience
pub use model;

// Re-export config types for convenience
pub use config::Config;

// Re-export auth types for convenience
pub use auth::{AuthError, AuthResult, CredentialGate, LoginFlow, LoginMode, LoginOutcome};

// Re-export files types for convenience
pub use files::{BrowserError, DirectoryBrowser, EntryMutator, MutationError, MutationResult};

// Re-export preference types for convenience
pub use preferences::{
    MemoryPreferenceStore, PreferenceBridge, PreferenceError, PreferenceEvent, PreferenceStore,
    PreferenceSubscription,
};

pub use app::Vault;
pub use shell::Shell;
pub use view::DirectoryView;
