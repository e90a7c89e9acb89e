pub mod scan;
pub mod sync;

/// Common exports for embedding the mirror engine.
pub mod prelude {
    pub use crate::scan::{snapshot, EntryKind, RelPath, TreeEntry, TreeSnapshot};
    pub use crate::sync::{
        mirror_once, ActionJournal, ActionSink, FingerprintMode, MirrorParams, SyncAction,
        SyncError, SyncStats,
    };
}
