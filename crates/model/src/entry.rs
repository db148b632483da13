//! Directory entry types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::size::format_size;

/// Kind of a directory entry, as reported by the file system at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Folder,
    /// Anything else (socket, device, dangling symlink).
    Other,
}

impl EntryKind {
    /// Whether the entry can be navigated into.
    pub fn is_folder(self) -> bool {
        matches!(self, EntryKind::Folder)
    }

    /// One-character marker used in listings.
    pub fn marker(self) -> char {
        match self {
            EntryKind::File => '-',
            EntryKind::Folder => 'd',
            EntryKind::Other => '?',
        }
    }
}

/// One immediate child of a listed directory.
///
/// Entries are built fresh on every listing; nothing here is cached between
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Display name (last path component).
    pub name: String,
    /// File or folder.
    pub kind: EntryKind,
    /// Size in bytes. Only set for files, and only when size display is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DirectoryEntry {
    /// Create an entry without size information.
    pub fn new(path: PathBuf, name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            path,
            name: name.into(),
            kind,
            size: None,
        }
    }

    /// Attach a size. Ignored for anything other than files.
    pub fn with_size(mut self, size: u64) -> Self {
        if self.kind == EntryKind::File {
            self.size = Some(size);
        }
        self
    }

    /// Human-readable size, if one was captured.
    pub fn display_size(&self) -> Option<String> {
        self.size.map(format_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_only_attached_to_files() {
        let folder = DirectoryEntry::new(PathBuf::from("/d/x"), "x", EntryKind::Folder).with_size(10);
        assert_eq!(folder.size, None);
        assert_eq!(folder.display_size(), None);

        let file = DirectoryEntry::new(PathBuf::from("/d/a.txt"), "a.txt", EntryKind::File).with_size(0);
        assert_eq!(file.size, Some(0));
        assert_eq!(file.display_size().as_deref(), Some("0 bytes"));
    }

    #[test]
    fn test_markers() {
        assert_eq!(EntryKind::Folder.marker(), 'd');
        assert_eq!(EntryKind::File.marker(), '-');
        assert!(EntryKind::Folder.is_folder());
        assert!(!EntryKind::Other.is_folder());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = DirectoryEntry::new(PathBuf::from("/d/notes"), "notes", EntryKind::Folder);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["kind"], "folder");
        assert_eq!(json["name"], "notes");
        assert!(json.get("size").is_none());
    }
}
