//! SQLite-backed settings storage.
//!
//! Holds the named values that must survive restarts, such as the listing
//! preferences. Values are stored as text; callers decide the encoding.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Path error.
    #[error("Invalid database path: {0}")]
    InvalidPath(String),
}

/// Result type for database operations.
pub type StorageResult<T> = Result<T, DatabaseError>;

/// Current schema version.
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Database wrapper for settings storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    ///
    /// Missing parent directories are created and pending migrations applied.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::InvalidPath(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        let mut db = Self { conn };
        db.run_migrations()?;

        tracing::debug!("Opened settings database at {:?}", path);
        Ok(db)
    }

    /// Open a database that lives only as long as this value.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get the current schema version.
    pub fn get_schema_version(&self) -> StorageResult<i32> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    fn run_migrations(&mut self) -> StorageResult<()> {
        let current_version = self.get_schema_version()?;

        if current_version < 1 {
            self.migrate_v1()?;
        }

        Ok(())
    }

    /// Migration to version 1: settings table.
    fn migrate_v1(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;

        tx.execute(
            &format!("PRAGMA user_version = {}", CURRENT_SCHEMA_VERSION),
            [],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Get a setting value by key.
    pub fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        let result = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// Set a setting value, inserting or replacing.
    pub fn set_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}
