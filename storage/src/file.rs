use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use filetime::FileTime;
use tokio::fs as tokio_fs;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use walkdir::WalkDir;

use crate::common::{StorageEntry, WalkEvent};

const WALK_CHANNEL_CAPACITY: usize = 1000;
const DIGEST_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem backend rooted at a single directory.
///
/// All keys are `/`-separated paths relative to the root.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage instance.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a key relative to the root.
    pub fn full_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Stream every entry below the root through a bounded channel.
    ///
    /// The walk runs on a blocking task; the root itself is not reported.
    /// Unreadable paths are reported as [`WalkEvent::Error`] and skipped.
    pub async fn walkdir(&self) -> mpsc::Receiver<WalkEvent> {
        let root = self.root.clone();
        let (tx, rx) = mpsc::channel(WALK_CHANNEL_CAPACITY);

        tokio::task::spawn_blocking(move || {
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .follow_links(false)
                .max_open(100);

            for entry in walker {
                let event = match entry {
                    Ok(entry) => match read_entry(&root, &entry) {
                        Ok(item) => WalkEvent::Entry(item),
                        Err(source) => WalkEvent::Error {
                            path: Some(entry.path().to_path_buf()),
                            source,
                        },
                    },
                    Err(err) => {
                        let path = err.path().map(Path::to_path_buf);
                        WalkEvent::Error {
                            path,
                            source: err.into(),
                        }
                    }
                };

                if tx.blocking_send(event).is_err() {
                    // Receiver dropped, stop walking
                    break;
                }
            }
        });

        rx
    }

    /// Check if a key exists below the root.
    pub async fn exists(&self, key: &str) -> io::Result<bool> {
        tokio_fs::try_exists(self.full_path(key)).await
    }

    /// Create a directory (and any missing parents) below the root.
    pub async fn create_dir_all(&self, key: &str) -> io::Result<()> {
        tokio_fs::create_dir_all(self.full_path(key)).await
    }

    /// Copy `src` over the keyed path, fully replacing any previous content.
    ///
    /// Parent directories are created as needed. The source modification
    /// time is restored on the copy so mtime-based comparisons stay stable
    /// across passes.
    pub async fn copy_from(&self, src: &Path, key: &str) -> io::Result<u64> {
        let dest = self.full_path(key);

        if let Some(parent) = dest.parent() {
            if !tokio_fs::try_exists(parent).await? {
                tokio_fs::create_dir_all(parent).await?;
            }
        }

        let written = tokio_fs::copy(src, &dest).await?;

        if let Ok(meta) = tokio_fs::metadata(src).await {
            if let Ok(mtime) = meta.modified() {
                let _ = filetime::set_file_mtime(&dest, FileTime::from_system_time(mtime));
            }
        }

        Ok(written)
    }

    /// Remove a file; a missing file counts as success.
    pub async fn remove_file(&self, key: &str) -> io::Result<()> {
        match tokio_fs::remove_file(self.full_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Remove a directory and anything still below it; missing counts as
    /// success.
    pub async fn remove_dir(&self, key: &str) -> io::Result<()> {
        match tokio_fs::remove_dir_all(self.full_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn read_entry(root: &Path, entry: &walkdir::DirEntry) -> io::Result<StorageEntry> {
    let metadata = entry.metadata().map_err(io::Error::from)?;

    let relative = entry
        .path()
        .strip_prefix(root)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let relative_path = relative.to_string_lossy().replace('\\', "/");

    Ok(StorageEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        path: entry.path().to_path_buf(),
        relative_path,
        is_dir: metadata.is_dir(),
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        modified: metadata.modified().unwrap_or(UNIX_EPOCH),
    })
}

/// MD5 digest of a file's content, read in fixed-size chunks.
pub async fn content_digest(path: &Path) -> io::Result<String> {
    let mut file = tokio_fs::File::open(path).await?;
    let mut context = md5::Context::new();
    let mut buf = vec![0u8; DIGEST_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        context.consume(&buf[..read]);
    }

    Ok(format!("{:x}", context.compute()))
}
