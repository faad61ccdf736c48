// src/fs/mock.rs

use super::{EntryKind, FileSystem};
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory tree keyed by absolute path.
///
/// Parent directories are created implicitly, so `add_file("/p/a/b.go")`
/// also makes `/p` and `/p/a` visible as directories.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, EntryKind>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), EntryKind::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), EntryKind::Dir);
    }

    /// A link entry; its target is irrelevant because links are never
    /// followed.
    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), EntryKind::Symlink);
    }

    /// Remove `path` and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|p, _| !p.starts_with(path));
    }

    fn insert(&self, path: &Path, kind: EntryKind) {
        let mut entries = self.entries.lock().unwrap();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(EntryKind::Dir);
        }
        entries.insert(path.to_path_buf(), kind);
    }
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> Result<EntryKind> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(path)
            .copied()
            .ok_or_else(|| anyhow!("No such file or directory: {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(EntryKind::Dir) => Ok(entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            Some(EntryKind::File | EntryKind::Symlink) => {
                Err(anyhow!("Not a directory: {:?}", path))
            }
            None => Err(anyhow!("No such file or directory: {:?}", path)),
        }
    }
}
