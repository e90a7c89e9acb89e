use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

/// One filesystem node produced by the tree walker.
#[derive(Debug, Clone)]
pub struct StorageEntry {
    /// File or directory name (final path component)
    pub name: String,
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated on every platform
    pub relative_path: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

/// Message produced by the streaming walker.
#[derive(Debug)]
pub enum WalkEvent {
    /// A successfully read entry
    Entry(StorageEntry),
    /// A path that could not be read; the walk continues past it
    Error {
        path: Option<PathBuf>,
        source: io::Error,
    },
}
