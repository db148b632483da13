//! An open listing of one directory.
//!
//! The view owns the in-memory entry list for the directory on screen. It
//! re-lists after every successful mutation and whenever the preference
//! subscription reports a change. Nothing is cached across re-lists.

use std::path::{Path, PathBuf};

use model::{validate_entry_name, DirectoryEntry, ListingPreferences};

use crate::files::{BrowserError, EntryMutator, MutationResult};
use crate::preferences::PreferenceSubscription;

/// Listing state for the directory currently shown.
pub struct DirectoryView {
    mutator: EntryMutator,
    directory: PathBuf,
    prefs: ListingPreferences,
    subscription: PreferenceSubscription,
    entries: Vec<DirectoryEntry>,
}

impl DirectoryView {
    /// Open `directory` (relative to the documents root, or absolute inside it).
    pub fn open(
        mutator: EntryMutator,
        directory: &Path,
        prefs: ListingPreferences,
        subscription: PreferenceSubscription,
    ) -> Result<Self, BrowserError> {
        let directory = mutator.browser().validate_dir(directory)?;
        let mut view = Self {
            mutator,
            directory,
            prefs,
            subscription,
            entries: Vec::new(),
        };
        view.refresh();
        Ok(view)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Directory path relative to the documents root.
    pub fn location(&self) -> &Path {
        self.mutator.browser().relative(&self.directory)
    }

    /// Screen title: the directory's own name.
    pub fn title(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "/".to_string())
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn preferences(&self) -> ListingPreferences {
        self.prefs
    }

    pub fn mutator(&self) -> &EntryMutator {
        &self.mutator
    }

    /// Re-list the directory from scratch.
    pub fn refresh(&mut self) {
        self.entries = self.mutator.browser().list(&self.directory, &self.prefs);
    }

    /// Apply pending preference changes. Returns whether the list was rebuilt.
    pub fn poll_changes(&mut self) -> bool {
        match self.subscription.latest() {
            Some(prefs) => {
                self.prefs = prefs;
                self.refresh();
                true
            }
            None => false,
        }
    }

    /// Find a listed entry by display name.
    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Descend into the child folder `name`.
    pub fn enter(&mut self, name: &str) -> Result<(), BrowserError> {
        let target = self
            .mutator
            .browser()
            .validate_dir(&self.directory.join(name))?;
        self.directory = target;
        self.refresh();
        Ok(())
    }

    /// Go to the parent folder. Returns false at the documents root.
    pub fn up(&mut self) -> bool {
        if self.directory == self.mutator.browser().root() {
            return false;
        }
        match self.directory.parent() {
            Some(parent) => {
                self.directory = parent.to_path_buf();
                self.refresh();
                true
            }
            None => false,
        }
    }

    pub fn create_folder(&mut self, name: &str) -> MutationResult<PathBuf> {
        let created = self.mutator.create_folder(&self.directory, name)?;
        self.refresh();
        Ok(created)
    }

    pub fn create_text_file(&mut self, name: &str, content: &str) -> MutationResult<PathBuf> {
        let created = self
            .mutator
            .create_text_file(&self.directory, name, content)?;
        self.refresh();
        Ok(created)
    }

    pub fn create_image_file(&mut self, name: &str, bytes: &[u8]) -> MutationResult<PathBuf> {
        let created = self
            .mutator
            .create_image_file(&self.directory, name, bytes)?;
        self.refresh();
        Ok(created)
    }

    pub fn rename(&mut self, name: &str, new_name: &str) -> MutationResult<PathBuf> {
        let path = self.child(name)?;
        let renamed = self.mutator.rename_entry(&path, new_name)?;
        self.refresh();
        Ok(renamed)
    }

    pub fn delete(&mut self, name: &str, recursive: bool) -> MutationResult<()> {
        let path = self.child(name)?;
        if recursive {
            self.mutator.delete_entry_recursive(&path)?;
        } else {
            self.mutator.delete_entry(&path)?;
        }
        self.refresh();
        Ok(())
    }

    /// Read a listed file as text.
    pub fn read_text(&self, name: &str) -> MutationResult<String> {
        self.mutator.read_text(&self.child(name)?)
    }

    /// Path of the listed entry `name`, which must be a plain entry name.
    fn child(&self, name: &str) -> MutationResult<PathBuf> {
        validate_entry_name(name)?;
        Ok(self.directory.join(name))
    }

    /// One display line per entry.
    pub fn rows(&self) -> Vec<String> {
        self.entries.iter().map(render_row).collect()
    }
}

/// Render a listing line: kind marker, name, and size when captured.
pub fn render_row(entry: &DirectoryEntry) -> String {
    let name = if entry.kind.is_folder() {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    };
    match entry.display_size() {
        Some(size) => format!("{} {:<40} {:>12}", entry.kind.marker(), name, size),
        None => format!("{} {}", entry.kind.marker(), name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{DirectoryBrowser, MutationError};
    use crate::preferences::PreferenceBridge;
    use model::PreferenceKey;
    use std::fs;
    use storage::Database;
    use tempfile::TempDir;

    struct Fixture {
        bridge: PreferenceBridge<Database>,
        mutator: EntryMutator,
        _temp_dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let browser = DirectoryBrowser::new(temp_dir.path()).unwrap();
            Self {
                bridge: PreferenceBridge::new(Database::open_in_memory().unwrap()),
                mutator: EntryMutator::new(browser),
                _temp_dir: temp_dir,
            }
        }

        fn open(&self, dir: &str) -> DirectoryView {
            DirectoryView::open(
                self.mutator.clone(),
                Path::new(dir),
                self.bridge.snapshot(),
                self.bridge.subscribe(),
            )
            .unwrap()
        }

        fn root(&self) -> &Path {
            self.mutator.browser().root()
        }
    }

    fn names(view: &DirectoryView) -> Vec<&str> {
        view.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_mutations_refresh_listing() {
        let fixture = Fixture::new();
        let mut view = fixture.open("");
        assert!(view.entries().is_empty());

        view.create_folder("X").unwrap();
        view.create_text_file("a.txt", "hello").unwrap();
        assert_eq!(names(&view), vec!["X", "a.txt"]);
        assert!(view.find("X").unwrap().kind.is_folder());

        view.rename("a.txt", "b.txt").unwrap();
        assert_eq!(names(&view), vec!["X", "b.txt"]);

        view.delete("b.txt", false).unwrap();
        assert_eq!(names(&view), vec!["X"]);
    }

    #[test]
    fn test_failed_mutation_leaves_listing() {
        let fixture = Fixture::new();
        let mut view = fixture.open("");
        view.create_text_file("a.txt", "hello").unwrap();

        let result = view.delete("missing", false);
        assert!(matches!(result, Err(MutationError::NotFound(_))));
        assert_eq!(names(&view), vec!["a.txt"]);

        let result = view.create_text_file("", "text");
        assert!(matches!(result, Err(MutationError::Validation(_))));
        assert_eq!(names(&view), vec!["a.txt"]);
    }

    #[test]
    fn test_dot_names_leave_current_folder_alone() {
        let fixture = Fixture::new();
        fs::create_dir(fixture.root().join("docs")).unwrap();
        fs::write(fixture.root().join("docs/a.txt"), "x").unwrap();
        let mut view = fixture.open("docs");

        for name in [".", "..", "a.txt/..", ""] {
            assert!(matches!(
                view.delete(name, true),
                Err(MutationError::Validation(_))
            ));
            assert!(matches!(
                view.rename(name, "moved"),
                Err(MutationError::Validation(_))
            ));
            assert!(view.read_text(name).is_err());
        }

        assert!(fixture.root().join("docs/a.txt").is_file());
        assert!(!fixture.root().join("moved").exists());
        assert_eq!(names(&view), vec!["a.txt"]);
    }

    #[test]
    fn test_preference_change_relists_open_views() {
        let fixture = Fixture::new();
        for name in ["b", "a", "c"] {
            fs::write(fixture.root().join(name), name).unwrap();
        }

        let mut first = fixture.open("");
        let mut second = fixture.open("");
        assert_eq!(names(&first), vec!["a", "b", "c"]);

        fixture.bridge.set(PreferenceKey::Sort, false).unwrap();
        assert!(first.poll_changes());
        assert!(second.poll_changes());
        assert_eq!(names(&first), vec!["c", "b", "a"]);
        assert_eq!(names(&second), vec!["c", "b", "a"]);
        assert!(!first.poll_changes());

        fixture.bridge.toggle(PreferenceKey::Sort).unwrap();
        assert!(first.poll_changes());
        assert_eq!(names(&first), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_size_toggle_relists() {
        let fixture = Fixture::new();
        fs::write(fixture.root().join("a"), "12345").unwrap();

        let mut view = fixture.open("");
        assert_eq!(view.entries()[0].size, Some(5));
        assert!(view.rows()[0].ends_with("5 bytes"));

        fixture.bridge.set(PreferenceKey::Size, false).unwrap();
        view.poll_changes();
        assert_eq!(view.entries()[0].size, None);
        assert_eq!(view.rows(), vec!["- a".to_string()]);
    }

    #[test]
    fn test_navigation() {
        let fixture = Fixture::new();
        let mut view = fixture.open("");
        view.create_folder("docs").unwrap();
        view.create_text_file("readme", "x").unwrap();

        assert!(matches!(
            view.enter("readme"),
            Err(BrowserError::NotADirectory(_))
        ));
        assert!(view.enter("missing").is_err());
        assert_eq!(view.location(), Path::new("."));

        view.enter("docs").unwrap();
        assert_eq!(view.title(), "docs");
        assert_eq!(view.location(), Path::new("docs"));
        view.create_text_file("inner.txt", "inside").unwrap();
        assert_eq!(names(&view), vec!["inner.txt"]);
        assert_eq!(view.read_text("inner.txt").unwrap(), "inside");

        assert!(view.up());
        assert_eq!(names(&view), vec!["docs", "readme"]);
        assert!(!view.up());
    }

    #[test]
    fn test_open_outside_root_fails() {
        let fixture = Fixture::new();
        let result = DirectoryView::open(
            fixture.mutator.clone(),
            Path::new(".."),
            ListingPreferences::default(),
            fixture.bridge.subscribe(),
        );
        assert!(matches!(result, Err(BrowserError::PathOutsideBoundary(_))));
    }

    #[test]
    fn test_render_row() {
        let folder = DirectoryEntry::new(PathBuf::from("/r/docs"), "docs", model::EntryKind::Folder);
        assert_eq!(render_row(&folder), "d docs/");

        let file = DirectoryEntry::new(PathBuf::from("/r/a"), "a", model::EntryKind::File)
            .with_size(1_500);
        let row = render_row(&file);
        assert!(row.starts_with("- a "));
        assert!(row.ends_with("1.5 KB"));
    }
}
