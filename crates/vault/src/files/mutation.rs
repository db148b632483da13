//! Create, rename, delete and read entries below the documents root.
//!
//! New files are written to a temporary file in the target directory and
//! then linked into place without overwriting, so a failed create never
//! leaves a partial file behind.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use model::{validate_entry_name, ValidationError};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::browser::{BrowserError, DirectoryBrowser};

/// Errors returned by entry mutations.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The name was rejected before touching the file system.
    #[error("invalid name: {0}")]
    Validation(#[from] ValidationError),

    /// An entry with the target name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The entry to change does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// The path is not a regular file.
    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    /// The file is not valid UTF-8 text.
    #[error("not a text file: {0}")]
    NotText(PathBuf),

    /// The bytes are not a decodable image.
    #[error("invalid image data: {0}")]
    InvalidImage(String),

    /// Path resolution failed.
    #[error(transparent)]
    Browser(BrowserError),

    /// The file system call failed.
    #[error("{op} failed for {path}: {source}")]
    Io {
        /// Operation that failed.
        op: &'static str,
        /// Path it was applied to.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<BrowserError> for MutationError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::InvalidName(e) => MutationError::Validation(e),
            BrowserError::PathNotFound(path) => MutationError::NotFound(path),
            other => MutationError::Browser(other),
        }
    }
}

/// Result type for entry mutations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Performs file-system changes inside the documents root.
#[derive(Debug, Clone)]
pub struct EntryMutator {
    browser: DirectoryBrowser,
}

impl EntryMutator {
    pub fn new(browser: DirectoryBrowser) -> Self {
        Self { browser }
    }

    pub fn browser(&self) -> &DirectoryBrowser {
        &self.browser
    }

    /// Create an empty folder `name` inside `parent`.
    pub fn create_folder(&self, parent: &Path, name: &str) -> MutationResult<PathBuf> {
        let target = self.browser.resolve_child(parent, name)?;

        fs::create_dir(&target).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => MutationError::AlreadyExists(target.clone()),
            _ => io_error("create folder", &target, e),
        })?;

        tracing::info!("Created folder {:?}", target);
        Ok(target)
    }

    /// Create a text file `name` inside `parent` holding `content` as UTF-8.
    pub fn create_text_file(
        &self,
        parent: &Path,
        name: &str,
        content: &str,
    ) -> MutationResult<PathBuf> {
        let target = self.browser.resolve_child(parent, name)?;
        write_new_file(&target, content.as_bytes())?;

        tracing::info!("Created text file {:?} ({} bytes)", target, content.len());
        Ok(target)
    }

    /// Create an image file `name` inside `parent`.
    ///
    /// `image_bytes` may be in any format the `image` crate decodes; the file
    /// is always written as PNG.
    pub fn create_image_file(
        &self,
        parent: &Path,
        name: &str,
        image_bytes: &[u8],
    ) -> MutationResult<PathBuf> {
        let target = self.browser.resolve_child(parent, name)?;

        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| MutationError::InvalidImage(e.to_string()))?;
        let mut png = Cursor::new(Vec::new());
        decoded
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| MutationError::InvalidImage(e.to_string()))?;

        let png = png.into_inner();
        write_new_file(&target, &png)?;

        tracing::info!(
            "Created image {:?} ({}x{}, {} bytes)",
            target,
            decoded.width(),
            decoded.height(),
            png.len()
        );
        Ok(target)
    }

    /// Delete a file or an empty folder.
    ///
    /// Non-empty folders fail with the error the file system reports.
    pub fn delete_entry(&self, path: &Path) -> MutationResult<()> {
        self.remove(path, false)
    }

    /// Delete a file or a folder with everything inside it.
    pub fn delete_entry_recursive(&self, path: &Path) -> MutationResult<()> {
        self.remove(path, true)
    }

    fn remove(&self, path: &Path, recursive: bool) -> MutationResult<()> {
        let target = self.browser.locate(path)?;
        let metadata =
            fs::symlink_metadata(&target).map_err(|e| io_error("inspect", &target, e))?;

        let result = if !metadata.is_dir() {
            fs::remove_file(&target)
        } else if recursive {
            fs::remove_dir_all(&target)
        } else {
            fs::remove_dir(&target)
        };
        result.map_err(|e| io_error("delete", &target, e))?;

        tracing::info!("Deleted {:?}", target);
        Ok(())
    }

    /// Rename an entry within its folder. Existing entries are never replaced.
    pub fn rename_entry(&self, path: &Path, new_name: &str) -> MutationResult<PathBuf> {
        validate_entry_name(new_name)?;
        let source = self.browser.locate(path)?;
        let target = source
            .parent()
            .map(|parent| parent.join(new_name))
            .ok_or_else(|| MutationError::NotFound(path.to_path_buf()))?;

        if target == source {
            return Ok(target);
        }
        if fs::symlink_metadata(&target).is_ok() {
            return Err(MutationError::AlreadyExists(target));
        }

        fs::rename(&source, &target).map_err(|e| io_error("rename", &source, e))?;

        tracing::info!("Renamed {:?} to {:?}", source, target);
        Ok(target)
    }

    /// Read a file as UTF-8 text.
    pub fn read_text(&self, path: &Path) -> MutationResult<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes).map_err(|_| MutationError::NotText(path.to_path_buf()))
    }

    /// Read a file's raw bytes.
    pub fn read_bytes(&self, path: &Path) -> MutationResult<Vec<u8>> {
        let target = self.browser.validate_path(path)?;
        if !target.is_file() {
            return Err(MutationError::NotAFile(target));
        }
        fs::read(&target).map_err(|e| io_error("read", &target, e))
    }
}

/// Write `bytes` to a new file at `target`, failing if it already exists.
fn write_new_file(target: &Path, bytes: &[u8]) -> MutationResult<()> {
    let parent = target
        .parent()
        .ok_or_else(|| MutationError::NotFound(target.to_path_buf()))?;

    if fs::symlink_metadata(target).is_ok() {
        return Err(MutationError::AlreadyExists(target.to_path_buf()));
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| io_error("create", target, e))?;
    temp.write_all(bytes)
        .and_then(|_| temp.flush())
        .map_err(|e| io_error("write", target, e))?;

    temp.persist_noclobber(target).map_err(|e| match e.error.kind() {
        std::io::ErrorKind::AlreadyExists => MutationError::AlreadyExists(target.to_path_buf()),
        _ => io_error("write", target, e.error),
    })?;

    Ok(())
}

fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> MutationError {
    MutationError::Io {
        op,
        path: path.to_path_buf(),
        source,
    }
}
