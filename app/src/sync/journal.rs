use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::scan::{EntryKind, RelPath};
use crate::sync::SyncAction;

/// Sink for applied sync actions.
///
/// The reconciler records every action it takes through this seam; tests
/// substitute an in-memory recorder.
pub trait ActionSink {
    fn record(&mut self, action: SyncAction, kind: EntryKind, path: &RelPath) -> io::Result<()>;
}

/// Append-only, line-oriented action journal.
///
/// One line per action, `timestamp action kind relative-path`:
///
/// ```text
/// 2026-08-06 10:15:42 create file docs/readme.md
/// ```
///
/// The format is stable so the journal can be tailed or grepped.
pub struct ActionJournal {
    path: PathBuf,
    file: File,
}

impl ActionJournal {
    /// Open (or create) the journal at `path`, creating parent directories
    /// as needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActionSink for ActionJournal {
    fn record(&mut self, action: SyncAction, kind: EntryKind, path: &RelPath) -> io::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "{} {} {} {}", timestamp, action, kind, path)?;

        // Mirror every journal line into the diagnostic log.
        log::info!("{} {} {}", action, kind, path);

        Ok(())
    }
}
