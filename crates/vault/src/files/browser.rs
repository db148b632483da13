//! Directory listing confined to the documents root.
//!
//! Every path handed to the browser is resolved against the root,
//! canonicalized, and rejected if it escapes the root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use model::{validate_entry_name, DirectoryEntry, EntryKind, ListingPreferences, ValidationError};
use thiserror::Error;

/// Errors that can occur during directory browsing.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The requested path is outside the documents root.
    #[error("path is outside the documents root: {0}")]
    PathOutsideBoundary(PathBuf),

    /// The requested path does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// The requested path is not a directory.
    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A name for a new entry was rejected.
    #[error("invalid name: {0}")]
    InvalidName(#[from] ValidationError),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lists directories below a fixed root.
#[derive(Debug, Clone)]
pub struct DirectoryBrowser {
    /// Canonical documents root.
    root: PathBuf,
    /// Whether names starting with '.' are listed.
    include_hidden: bool,
}

impl DirectoryBrowser {
    /// Create a browser rooted at an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, BrowserError> {
        let root = root.as_ref();
        let canonical = canonicalize(root)?;
        if !canonical.is_dir() {
            return Err(BrowserError::NotADirectory(canonical));
        }

        Ok(Self {
            root: canonical,
            include_hidden: true,
        })
    }

    /// Create the root directory if needed, then open a browser on it.
    pub fn open_or_create(root: impl AsRef<Path>) -> Result<Self, BrowserError> {
        let root = root.as_ref();
        if !root.exists() {
            fs::create_dir_all(root)?;
            tracing::info!("Created documents directory {:?}", root);
        }
        Self::new(root)
    }

    /// Set whether hidden entries are listed (default: true).
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// The canonical documents root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path against the root without touching the file system.
    ///
    /// Relative paths are taken relative to the root.
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Path relative to the root, for display. `.` for the root itself.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => Path::new("."),
            Ok(rel) => rel,
            Err(_) => path,
        }
    }

    /// Canonicalize a path and check it lies within the root.
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, BrowserError> {
        let canonical = canonicalize(&self.absolutize(path))?;

        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(BrowserError::PathOutsideBoundary(path.to_path_buf()))
        }
    }

    /// Validate a directory path.
    pub fn validate_dir(&self, path: &Path) -> Result<PathBuf, BrowserError> {
        let canonical = self.validate_path(path)?;
        if !canonical.is_dir() {
            return Err(BrowserError::NotADirectory(canonical));
        }
        Ok(canonical)
    }

    /// Path for a new child `name` of `parent`.
    ///
    /// The parent must be a directory inside the root; the child need not exist.
    pub fn resolve_child(&self, parent: &Path, name: &str) -> Result<PathBuf, BrowserError> {
        validate_entry_name(name)?;
        let parent = self.validate_dir(parent)?;
        Ok(parent.join(name))
    }

    /// Locate an existing entry without following a symlink in its last component.
    ///
    /// The parent is canonicalized and checked; the entry itself must exist.
    /// The root itself cannot be located this way, and neither can a path
    /// whose last segment is `.` or `..`: normalization would otherwise turn
    /// `docs/.` into `docs`.
    pub fn locate(&self, path: &Path) -> Result<PathBuf, BrowserError> {
        let raw = path.to_string_lossy();
        let last = raw
            .trim_end_matches(std::path::is_separator)
            .rsplit(std::path::is_separator)
            .next()
            .unwrap_or_default();
        if last == "." || last == ".." {
            return Err(ValidationError::Reserved(last.to_string()).into());
        }

        let absolute = self.absolutize(path);
        let name = match absolute.components().next_back() {
            Some(Component::Normal(name)) => name.to_os_string(),
            _ => return Err(BrowserError::PathOutsideBoundary(path.to_path_buf())),
        };
        let parent = absolute
            .parent()
            .ok_or_else(|| BrowserError::PathOutsideBoundary(path.to_path_buf()))?;

        let located = self.validate_dir(parent)?.join(name);
        if located == self.root {
            return Err(BrowserError::PathOutsideBoundary(path.to_path_buf()));
        }

        match fs::symlink_metadata(&located) {
            Ok(_) => Ok(located),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BrowserError::PathNotFound(path.to_path_buf()))
            }
            Err(e) => Err(BrowserError::Io(e)),
        }
    }

    /// List the immediate children of `directory`.
    ///
    /// Enumeration failures (missing directory, permissions, boundary
    /// violations) produce an empty listing. Use [`try_list`](Self::try_list)
    /// to see the error.
    pub fn list(&self, directory: &Path, prefs: &ListingPreferences) -> Vec<DirectoryEntry> {
        match self.try_list(directory, prefs) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Listing {:?} failed, showing it empty: {}", directory, e);
                Vec::new()
            }
        }
    }

    /// List the immediate children of `directory`, reporting failures.
    pub fn try_list(
        &self,
        directory: &Path,
        prefs: &ListingPreferences,
    ) -> Result<Vec<DirectoryEntry>, BrowserError> {
        let canonical = self.validate_dir(directory)?;
        let entries = fs::read_dir(&canonical).map_err(|e| map_io(&canonical, e))?;

        let mut results = Vec::new();
        for entry_result in entries {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {:?}: {}", canonical, e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().to_string();
            if !self.include_hidden && name.starts_with('.') {
                continue;
            }

            results.push(describe(entry.path(), name, prefs.show_size));
        }

        sort_entries(&mut results, prefs);

        tracing::debug!("Listed {} entries in {:?}", results.len(), canonical);
        Ok(results)
    }

    /// Describe a single entry inside the root.
    pub fn entry(
        &self,
        path: &Path,
        prefs: &ListingPreferences,
    ) -> Result<DirectoryEntry, BrowserError> {
        let located = self.locate(path)?;
        let name = located
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(describe(located, name, prefs.show_size))
    }
}

/// Order entries by display name, then full path, in the requested direction.
pub fn sort_entries(entries: &mut [DirectoryEntry], prefs: &ListingPreferences) {
    entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    if prefs.sort_descending {
        entries.reverse();
    }
}

/// Read kind (and size, for files) at read time.
///
/// Kind and size come from one metadata read, so a file always has a size.
fn describe(path: PathBuf, name: String, with_size: bool) -> DirectoryEntry {
    // Follows symlinks; a dangling link reads as Other.
    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("Cannot read metadata of {:?}: {}", path, e);
            return DirectoryEntry::new(path, name, EntryKind::Other);
        }
    };

    if metadata.is_dir() {
        DirectoryEntry::new(path, name, EntryKind::Folder)
    } else if metadata.is_file() {
        let entry = DirectoryEntry::new(path, name, EntryKind::File);
        if with_size {
            entry.with_size(metadata.len())
        } else {
            entry
        }
    } else {
        DirectoryEntry::new(path, name, EntryKind::Other)
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, BrowserError> {
    fs::canonicalize(path).map_err(|e| map_io(path, e))
}

fn map_io(path: &Path, e: std::io::Error) -> BrowserError {
    match e.kind() {
        std::io::ErrorKind::NotFound => BrowserError::PathNotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => BrowserError::PermissionDenied(path.to_path_buf()),
        _ => BrowserError::Io(e),
    }
}
