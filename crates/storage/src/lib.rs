//! Storage backends for DocVault.
//!
//! This crate provides SQLite-based persistence for:
//! - Application settings (listing preferences)
//!
//! And secure keychain storage for:
//! - The vault password

mod database;
pub mod keychain;

pub use database::{Database, DatabaseError, StorageResult};

pub use keychain::{
    KeychainBackend, KeychainError, KeychainResult, KeychainSlot, MemoryKeychain, SystemKeychain,
    DEFAULT_KEY, DEFAULT_SERVICE,
};
