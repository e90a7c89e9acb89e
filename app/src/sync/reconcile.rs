use std::io;
use std::path::Path;

use storage::{content_digest, LocalStorage};

use crate::scan::{EntryKind, RelPath, TreeEntry, TreeSnapshot};
use crate::sync::journal::ActionSink;
use crate::sync::{FingerprintMode, SyncAction, SyncStats};

/// Operations that make the replica match the source.
///
/// Orderings are part of the contract: `create_dirs` is parent-before-child,
/// `delete_dirs` is deepest-first, and deletions are applied before
/// creations so a kind conflict at one path is cleared before its
/// replacement appears.
#[derive(Debug, Default)]
pub struct SyncPlan {
    /// Directories to create in the replica, parents first
    pub create_dirs: Vec<RelPath>,
    /// Source files to copy unconditionally (missing or replaced in replica)
    pub copy_files: Vec<TreeEntry>,
    /// (source, replica) file pairs pending a fingerprint comparison
    pub check_files: Vec<(TreeEntry, TreeEntry)>,
    /// Replica files to delete
    pub delete_files: Vec<RelPath>,
    /// Replica directories to delete, deepest first
    pub delete_dirs: Vec<RelPath>,
}

impl SyncPlan {
    /// Number of planned operations, pending fingerprint checks included.
    pub fn len(&self) -> usize {
        self.create_dirs.len()
            + self.copy_files.len()
            + self.check_files.len()
            + self.delete_files.len()
            + self.delete_dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compare two snapshots and derive the operations that reconcile them.
pub fn plan(source: &TreeSnapshot, replica: &TreeSnapshot) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for (path, src_entry) in source.iter() {
        match replica.get(path) {
            None => match src_entry.kind {
                EntryKind::Directory => plan.create_dirs.push(path.clone()),
                EntryKind::File => plan.copy_files.push(src_entry.clone()),
            },
            Some(rep_entry) if rep_entry.kind != src_entry.kind => {
                // Same path, different kind: clear the replica entry, then
                // recreate it from the source.
                match rep_entry.kind {
                    EntryKind::File => plan.delete_files.push(path.clone()),
                    EntryKind::Directory => plan.delete_dirs.push(path.clone()),
                }
                match src_entry.kind {
                    EntryKind::Directory => plan.create_dirs.push(path.clone()),
                    EntryKind::File => plan.copy_files.push(src_entry.clone()),
                }
            }
            Some(rep_entry) => {
                if src_entry.kind == EntryKind::File {
                    plan.check_files.push((src_entry.clone(), rep_entry.clone()));
                }
            }
        }
    }

    for (path, rep_entry) in replica.iter() {
        if !source.contains(path) {
            match rep_entry.kind {
                EntryKind::File => plan.delete_files.push(path.clone()),
                EntryKind::Directory => plan.delete_dirs.push(path.clone()),
            }
        }
    }

    // A parent path is a strict prefix of its children, so ascending order
    // is parent-first and the reverse is deepest-first.
    plan.create_dirs.sort();
    plan.delete_files.sort();
    plan.delete_dirs.sort();
    plan.delete_dirs.reverse();

    plan
}

/// Apply a plan to the replica, best effort: a failed entry is logged,
/// counted and skipped; the pass continues with the remaining entries.
pub async fn apply(
    plan: &SyncPlan,
    source_store: &LocalStorage,
    replica_store: &LocalStorage,
    mode: FingerprintMode,
    sink: &mut dyn ActionSink,
    stats: &mut SyncStats,
) {
    for path in &plan.delete_files {
        match replica_store.remove_file(path.as_str()).await {
            Ok(()) => {
                stats.deleted_files += 1;
                record(sink, stats, SyncAction::Delete, EntryKind::File, path);
            }
            Err(e) => entry_failed(stats, path, &e),
        }
    }

    for path in &plan.delete_dirs {
        match replica_store.remove_dir(path.as_str()).await {
            Ok(()) => {
                stats.deleted_dirs += 1;
                record(sink, stats, SyncAction::Delete, EntryKind::Directory, path);
            }
            Err(e) => entry_failed(stats, path, &e),
        }
    }

    for path in &plan.create_dirs {
        match replica_store.create_dir_all(path.as_str()).await {
            Ok(()) => {
                stats.created_dirs += 1;
                record(sink, stats, SyncAction::Create, EntryKind::Directory, path);
            }
            Err(e) => entry_failed(stats, path, &e),
        }
    }

    for entry in &plan.copy_files {
        let src = entry.path.to_native(source_store.root());
        match replica_store.copy_from(&src, entry.path.as_str()).await {
            Ok(_) => {
                stats.created_files += 1;
                record(sink, stats, SyncAction::Create, EntryKind::File, &entry.path);
            }
            Err(e) => entry_failed(stats, &entry.path, &e),
        }
    }

    for (src_entry, rep_entry) in &plan.check_files {
        let src = src_entry.path.to_native(source_store.root());
        let rep = rep_entry.path.to_native(replica_store.root());

        match files_match(src_entry, rep_entry, &src, &rep, mode).await {
            Ok(true) => stats.unchanged_files += 1,
            Ok(false) => match replica_store.copy_from(&src, src_entry.path.as_str()).await {
                Ok(_) => {
                    stats.updated_files += 1;
                    record(
                        sink,
                        stats,
                        SyncAction::Update,
                        EntryKind::File,
                        &src_entry.path,
                    );
                }
                Err(e) => entry_failed(stats, &src_entry.path, &e),
            },
            Err(e) => entry_failed(stats, &src_entry.path, &e),
        }
    }
}

/// Fingerprint comparison: sizes first, then the configured policy.
async fn files_match(
    src_entry: &TreeEntry,
    rep_entry: &TreeEntry,
    src: &Path,
    rep: &Path,
    mode: FingerprintMode,
) -> io::Result<bool> {
    if src_entry.size != rep_entry.size {
        return Ok(false);
    }

    match mode {
        FingerprintMode::Quick => Ok(src_entry.modified == rep_entry.modified),
        FingerprintMode::Checksum => Ok(content_digest(src).await? == content_digest(rep).await?),
    }
}

fn record(
    sink: &mut dyn ActionSink,
    stats: &mut SyncStats,
    action: SyncAction,
    kind: EntryKind,
    path: &RelPath,
) {
    if let Err(e) = sink.record(action, kind, path) {
        log::error!("Failed to journal {} {} {}: {}", action, kind, path, e);
        stats.errors += 1;
    }
}

fn entry_failed(stats: &mut SyncStats, path: &RelPath, error: &io::Error) {
    log::error!("Skipping {}: {}", path, error);
    stats.errors += 1;
}
