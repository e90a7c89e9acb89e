//! Tree reconciliation - makes a replica directory identical to a source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

use storage::LocalStorage;

use crate::scan::snapshot;

pub mod journal;
pub mod reconcile;


pub use journal::{ActionJournal, ActionSink};
pub use reconcile::{plan, SyncPlan};

/// Mirror parameters - resolved input for one reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorParams {
    /// Directory to mirror from
    pub source: String,

    /// Directory made identical to the source
    pub replica: String,

    /// File equality policy
    pub fingerprint: FingerprintMode,
}

impl Default for MirrorParams {
    fn default() -> Self {
        Self {
            source: String::from("."),
            replica: String::from("."),
            fingerprint: FingerprintMode::default(),
        }
    }
}

/// File equality policy used when a path exists in both trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerprintMode {
    /// Size plus MD5 content digest
    Checksum,
    /// Size plus modification time
    Quick,
}

impl Default for FingerprintMode {
    fn default() -> Self {
        FingerprintMode::Checksum
    }
}

impl fmt::Display for FingerprintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintMode::Checksum => write!(f, "checksum"),
            FingerprintMode::Quick => write!(f, "quick"),
        }
    }
}

/// One applied filesystem operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Create => write!(f, "create"),
            SyncAction::Update => write!(f, "update"),
            SyncAction::Delete => write!(f, "delete"),
        }
    }
}

/// Errors that abort a reconciliation pass.
///
/// Per-entry I/O failures do not abort; they are logged and counted in
/// [`SyncStats::errors`] while the pass continues.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("source directory missing or not a directory: {0}")]
    SourceMissing(PathBuf),

    #[error("replica root cannot be created: {path}: {source}")]
    ReplicaUncreatable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("i/o failure at {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub created_dirs: usize,
    pub created_files: usize,
    pub updated_files: usize,
    pub deleted_files: usize,
    pub deleted_dirs: usize,
    pub unchanged_files: usize,
    pub errors: usize,

    // Display metadata
    pub source: String,
    pub replica: String,
    pub log_path: String,
    pub total_time: String,
}

impl SyncStats {
    fn for_params(params: &MirrorParams) -> Self {
        Self {
            source: params.source.clone(),
            replica: params.replica.clone(),
            ..Default::default()
        }
    }

    /// Total number of actions applied during the pass.
    pub fn actions(&self) -> usize {
        self.created_dirs
            + self.created_files
            + self.updated_files
            + self.deleted_files
            + self.deleted_dirs
    }
}

impl Default for SyncStats {
    fn default() -> Self {
        Self {
            created_dirs: 0,
            created_files: 0,
            updated_files: 0,
            deleted_files: 0,
            deleted_dirs: 0,
            unchanged_files: 0,
            errors: 0,

            source: String::new(),
            replica: String::new(),
            log_path: String::new(),
            total_time: String::from("0s"),
        }
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=================================================================="
        )?;
        writeln!(
            f,
            "                        Mirror Statistics                         "
        )?;
        writeln!(
            f,
            "=================================================================="
        )?;
        writeln!(f)?;
        writeln!(f, "   Source     :    {}", self.source)?;
        writeln!(f, "   Replica    :    {}", self.replica)?;
        writeln!(f, "   Journal    :    {}", self.log_path)?;
        writeln!(f, "   Total time :    {}", self.total_time)?;
        writeln!(f)?;
        writeln!(
            f,
            " ------------------------- Applied Actions -----------------------"
        )?;
        writeln!(
            f,
            "   Created directories:                         {}",
            self.created_dirs
        )?;
        writeln!(
            f,
            "   Created files:                               {}",
            self.created_files
        )?;
        writeln!(
            f,
            "   Updated files:                               {}",
            self.updated_files
        )?;
        writeln!(
            f,
            "   Deleted files:                               {}",
            self.deleted_files
        )?;
        writeln!(
            f,
            "   Deleted directories:                         {}",
            self.deleted_dirs
        )?;
        writeln!(
            f,
            " --------------------------- Unchanged ---------------------------"
        )?;
        writeln!(
            f,
            "   Files already in sync:                       {}",
            self.unchanged_files
        )?;
        writeln!(
            f,
            " ---------------------------- Errors -----------------------------"
        )?;
        writeln!(
            f,
            "   Entries skipped:                             {}",
            self.errors
        )?;
        writeln!(
            f,
            " -----------------------------------------------------------------"
        )
    }
}

/// Run one reconciliation pass: snapshot both trees, plan, apply.
///
/// Each pass is independent and idempotent; a pass over already-identical
/// trees applies zero actions.
pub async fn mirror_once(
    params: &MirrorParams,
    sink: &mut dyn ActionSink,
) -> Result<SyncStats, SyncError> {
    log::info!("Starting mirror pass with params: {:?}", params);
    let started = Instant::now();

    let source_root = PathBuf::from(&params.source);
    match tokio::fs::metadata(&source_root).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(SyncError::SourceMissing(source_root)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SyncError::SourceMissing(source_root));
        }
        Err(e) => {
            return Err(SyncError::IoFailure {
                path: source_root,
                source: e,
            });
        }
    }

    let replica_root = PathBuf::from(&params.replica);
    tokio::fs::create_dir_all(&replica_root)
        .await
        .map_err(|source| SyncError::ReplicaUncreatable {
            path: replica_root.clone(),
            source,
        })?;

    let source_store = LocalStorage::new(&source_root);
    let replica_store = LocalStorage::new(&replica_root);

    let source_tree = snapshot(&source_store)
        .await
        .map_err(|source| SyncError::IoFailure {
            path: source_root.clone(),
            source,
        })?;
    let replica_tree = snapshot(&replica_store)
        .await
        .map_err(|source| SyncError::IoFailure {
            path: replica_root.clone(),
            source,
        })?;

    let plan = reconcile::plan(&source_tree, &replica_tree);
    log::debug!("Planned operations: {}", plan.len());

    let mut stats = SyncStats::for_params(params);
    reconcile::apply(
        &plan,
        &source_store,
        &replica_store,
        params.fingerprint,
        sink,
        &mut stats,
    )
    .await;

    stats.total_time = format!("{:.2}s", started.elapsed().as_secs_f64());
    log::info!(
        "Mirror pass finished: {} actions, {} unchanged, {} errors",
        stats.actions(),
        stats.unchanged_files,
        stats.errors
    );

    Ok(stats)
}
