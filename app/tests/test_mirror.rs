use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use app::scan::{EntryKind, RelPath};
use app::sync::{
    mirror_once, ActionJournal, ActionSink, FingerprintMode, MirrorParams, SyncAction, SyncError,
};
use tempfile::tempdir;

/// Records actions in memory instead of a journal file.
#[derive(Default)]
struct RecordingSink {
    lines: Vec<String>,
}

impl ActionSink for RecordingSink {
    fn record(&mut self, action: SyncAction, kind: EntryKind, path: &RelPath) -> io::Result<()> {
        self.lines.push(format!("{} {} {}", action, kind, path));
        Ok(())
    }
}

fn params(source: &Path, replica: &Path) -> MirrorParams {
    MirrorParams {
        source: source.to_string_lossy().into_owned(),
        replica: replica.to_string_lossy().into_owned(),
        fingerprint: FingerprintMode::Checksum,
    }
}

fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let _ = env_logger::builder().is_test(true).try_init();

    let temp = tempdir().unwrap();
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    fs::create_dir_all(&source).unwrap();
    (temp, source, replica)
}

#[tokio::test]
async fn creates_missing_file_in_replica() {
    let (_temp, source, replica) = setup();
    fs::write(source.join("a.txt"), "hello").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(replica.join("a.txt")).unwrap(), "hello");
    assert_eq!(stats.created_files, 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(sink.lines, vec!["create file a.txt"]);
}

#[tokio::test]
async fn updates_file_with_different_content() {
    let (_temp, source, replica) = setup();
    fs::create_dir_all(source.join("dir")).unwrap();
    fs::create_dir_all(replica.join("dir")).unwrap();
    // Same length on both sides so only the content digest can tell them
    // apart.
    fs::write(source.join("dir").join("b.txt"), "fresh!!").unwrap();
    fs::write(replica.join("dir").join("b.txt"), "stale!!").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(replica.join("dir").join("b.txt")).unwrap(),
        "fresh!!"
    );
    assert_eq!(stats.updated_files, 1);
    assert_eq!(stats.created_files, 0);
    assert_eq!(stats.deleted_files, 0);
    assert_eq!(sink.lines, vec!["update file dir/b.txt"]);
}

#[tokio::test]
async fn deletes_replica_only_file() {
    let (_temp, source, replica) = setup();
    fs::create_dir_all(&replica).unwrap();
    fs::write(replica.join("old.txt"), "obsolete").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert!(!replica.join("old.txt").exists());
    assert_eq!(stats.deleted_files, 1);
    assert_eq!(sink.lines, vec!["delete file old.txt"]);
}

#[tokio::test]
async fn missing_source_aborts_without_touching_replica() {
    let (_temp, source, replica) = setup();
    fs::remove_dir_all(&source).unwrap();
    fs::create_dir_all(&replica).unwrap();
    fs::write(replica.join("keep.txt"), "still here").unwrap();

    let mut sink = RecordingSink::default();
    let err = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::SourceMissing(_)));
    assert_eq!(
        fs::read_to_string(replica.join("keep.txt")).unwrap(),
        "still here"
    );
    assert!(sink.lines.is_empty());
}

#[tokio::test]
async fn second_pass_applies_zero_actions() {
    let (_temp, source, replica) = setup();
    fs::create_dir_all(source.join("a").join("b")).unwrap();
    fs::write(source.join("a").join("b").join("deep.txt"), "data").unwrap();
    fs::write(source.join("top.txt"), "more data").unwrap();

    let mut sink = RecordingSink::default();
    let first = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();
    assert_eq!(first.actions(), 4);

    let mut sink = RecordingSink::default();
    let second = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert_eq!(second.actions(), 0);
    assert_eq!(second.unchanged_files, 2);
    assert!(sink.lines.is_empty());
}

#[tokio::test]
async fn removes_populated_subtree_without_errors() {
    let (_temp, source, replica) = setup();
    fs::create_dir_all(replica.join("a").join("b")).unwrap();
    fs::write(replica.join("a").join("f1.txt"), "1").unwrap();
    fs::write(replica.join("a").join("b").join("f2.txt"), "2").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert!(!replica.join("a").exists());
    assert_eq!(stats.deleted_files, 2);
    assert_eq!(stats.deleted_dirs, 2);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn repairs_kind_mismatch_both_ways() {
    let (_temp, source, replica) = setup();
    // Source: "node" is a file, "other" is a directory.
    fs::write(source.join("node"), "file content").unwrap();
    fs::create_dir_all(source.join("other")).unwrap();
    // Replica: the kinds are swapped.
    fs::create_dir_all(replica.join("node")).unwrap();
    fs::write(replica.join("node").join("leftover.txt"), "x").unwrap();
    fs::write(replica.join("other"), "was a file").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(replica.join("node")).unwrap(),
        "file content"
    );
    assert!(replica.join("other").is_dir());
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn equal_content_triggers_no_update() {
    let (_temp, source, replica) = setup();
    fs::create_dir_all(&replica).unwrap();
    fs::write(source.join("same.txt"), "identical").unwrap();
    fs::write(replica.join("same.txt"), "identical").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert_eq!(stats.updated_files, 0);
    assert_eq!(stats.unchanged_files, 1);
    assert!(sink.lines.is_empty());
}

#[tokio::test]
async fn quick_mode_skips_unchanged_copies() {
    let (_temp, source, replica) = setup();
    fs::write(source.join("a.txt"), "content").unwrap();

    let mut p = params(&source, &replica);
    p.fingerprint = FingerprintMode::Quick;

    let mut sink = RecordingSink::default();
    let first = mirror_once(&p, &mut sink).await.unwrap();
    assert_eq!(first.created_files, 1);

    // The copy restored the source mtime, so the second pass sees equal
    // fingerprints without reading content.
    let mut sink = RecordingSink::default();
    let second = mirror_once(&p, &mut sink).await.unwrap();

    assert_eq!(second.actions(), 0);
    assert_eq!(second.unchanged_files, 1);
}

#[tokio::test]
async fn source_truncation_propagates() {
    let (_temp, source, replica) = setup();
    fs::create_dir_all(&replica).unwrap();
    fs::write(source.join("a.txt"), "").unwrap();
    fs::write(replica.join("a.txt"), "stale content").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(replica.join("a.txt")).unwrap(), "");
    assert_eq!(stats.updated_files, 1);
}

#[tokio::test]
async fn creates_nested_source_tree() {
    let (_temp, source, replica) = setup();
    fs::create_dir_all(source.join("a").join("b").join("c")).unwrap();
    fs::write(source.join("a").join("b").join("c").join("f.txt"), "deep").unwrap();

    let mut sink = RecordingSink::default();
    let stats = mirror_once(&params(&source, &replica), &mut sink)
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(replica.join("a").join("b").join("c").join("f.txt")).unwrap(),
        "deep"
    );
    assert_eq!(stats.created_dirs, 3);
    assert_eq!(stats.created_files, 1);
}

#[tokio::test]
async fn journal_lines_are_timestamped_records() {
    let (temp, source, replica) = setup();
    fs::write(source.join("a.txt"), "hello").unwrap();

    let logfile = temp.path().join("mirror.log");
    let mut journal = ActionJournal::open(&logfile).unwrap();
    assert_eq!(journal.path(), logfile);

    mirror_once(&params(&source, &replica), &mut journal)
        .await
        .unwrap();

    let contents = fs::read_to_string(&logfile).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);

    // `YYYY-MM-DD HH:MM:SS action kind path`
    let fields: Vec<&str> = lines[0].split_whitespace().collect();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields[0].len(), 10);
    assert_eq!(fields[1].len(), 8);
    assert_eq!(fields[2], "create");
    assert_eq!(fields[3], "file");
    assert_eq!(fields[4], "a.txt");
}

#[tokio::test]
async fn journal_appends_across_passes() {
    let (temp, source, replica) = setup();
    fs::write(source.join("a.txt"), "v1").unwrap();

    let logfile = temp.path().join("mirror.log");
    let mut journal = ActionJournal::open(&logfile).unwrap();

    mirror_once(&params(&source, &replica), &mut journal)
        .await
        .unwrap();

    fs::write(source.join("a.txt"), "v2").unwrap();
    mirror_once(&params(&source, &replica), &mut journal)
        .await
        .unwrap();

    let contents = fs::read_to_string(&logfile).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("create file a.txt"));
    assert!(lines[1].contains("update file a.txt"));
}
