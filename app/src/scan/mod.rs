use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use storage::{LocalStorage, WalkEvent};


/// Path relative to a tree root, `/`-separated on every platform.
///
/// Entries from both trees are keyed by this type so the same logical node
/// compares equal no matter which native separator the walker produced.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelPath(String);

impl RelPath {
    /// Build from a raw relative path, normalizing separators and trailing
    /// slashes.
    pub fn new(raw: impl Into<String>) -> Self {
        let mut normalized = raw.into().replace('\\', "/");
        while normalized.ends_with('/') {
            normalized.pop();
        }
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Native path for this entry under the given root.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }

    /// Number of path components.
    pub fn depth(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.matches('/').count() + 1
        }
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// One file or directory node below a tree root.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: RelPath,
    pub kind: EntryKind,
    /// Size in bytes; 0 for directories.
    pub size: u64,
    /// Last modification time; UNIX_EPOCH for directories.
    pub modified: SystemTime,
}

impl TreeEntry {
    pub fn file(path: RelPath, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    pub fn dir(path: RelPath) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
            size: 0,
            modified: UNIX_EPOCH,
        }
    }
}

/// Point-in-time view of a directory tree, keyed by relative path.
///
/// Snapshots are rebuilt from the filesystem on every pass; nothing is
/// cached between passes.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    root: PathBuf,
    entries: BTreeMap<RelPath, TreeEntry>,
}

impl TreeSnapshot {
    /// Build a snapshot from pre-computed entries.
    pub fn from_entries(root: impl Into<PathBuf>, entries: Vec<TreeEntry>) -> Self {
        let entries = entries.into_iter().map(|e| (e.path.clone(), e)).collect();
        Self {
            root: root.into(),
            entries,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &RelPath) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in ascending path order (parents before children).
    pub fn iter(&self) -> impl Iterator<Item = (&RelPath, &TreeEntry)> {
        self.entries.iter()
    }
}

/// Enumerate every entry below the storage root into a snapshot.
///
/// Entries that cannot be read are logged and skipped; failing to read the
/// root itself is an error.
pub async fn snapshot(store: &LocalStorage) -> io::Result<TreeSnapshot> {
    let root = store.root().to_path_buf();
    let mut rx = store.walkdir().await;
    let mut entries = BTreeMap::new();

    while let Some(event) = rx.recv().await {
        match event {
            WalkEvent::Entry(item) => {
                let path = RelPath::new(item.relative_path);
                let kind = if item.is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                entries.insert(
                    path.clone(),
                    TreeEntry {
                        path,
                        kind,
                        size: item.size,
                        modified: item.modified,
                    },
                );
            }
            WalkEvent::Error { path, source } => {
                if path.as_deref() == Some(root.as_path()) {
                    return Err(source);
                }
                log::warn!(
                    "Skipping unreadable entry {}: {}",
                    path.as_deref().unwrap_or_else(|| Path::new("?")).display(),
                    source
                );
            }
        }
    }

    Ok(TreeSnapshot { root, entries })
}
