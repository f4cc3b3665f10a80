use chrono::{DateTime, Duration, Utc};
use mirror_core::{Leaf, MirrorError};
use mirror_sync::{write_local, WriteOutcome};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use test_helpers::{init_tracing, static_leaf, CountingContent, FailingContent};

fn mtime(path: &Path) -> DateTime<Utc> {
    fs::metadata(path).unwrap().modified().unwrap().into()
}

fn atime(path: &Path) -> DateTime<Utc> {
    fs::metadata(path).unwrap().accessed().unwrap().into()
}

/// Filesystems may drop sub-second precision, so compare whole seconds
fn assert_same_second(actual: DateTime<Utc>, expected: DateTime<Utc>) {
    assert_eq!(
        actual.timestamp(),
        expected.timestamp(),
        "expected {} got {}",
        expected,
        actual
    );
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[tokio::test]
async fn test_new_file_is_written_with_timestamps() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a");
    let modified_at = now() - Duration::days(3);

    let outcome = write_local(&path, &static_leaf(modified_at, "test"))
        .await
        .unwrap();

    assert_eq!(outcome, WriteOutcome::Written { bytes: 4 });
    // Check atime before reading the file back, which may bump it
    assert_same_second(atime(&path), modified_at);
    assert_same_second(mtime(&path), modified_at);
    assert_eq!(fs::read_to_string(&path).unwrap(), "test");
}

#[tokio::test]
async fn test_newer_leaf_overwrites_older_file() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a");
    let first = now() - Duration::hours(1);

    write_local(&path, &static_leaf(first, "old body"))
        .await
        .unwrap();

    let second = first + Duration::seconds(1);
    let outcome = write_local(&path, &static_leaf(second, "new"))
        .await
        .unwrap();

    assert_eq!(outcome, WriteOutcome::Written { bytes: 3 });
    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    assert_same_second(mtime(&path), second);
}

#[tokio::test]
async fn test_older_leaf_does_not_overwrite() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a");
    let first = now() - Duration::hours(1);

    write_local(&path, &static_leaf(first, "keep me"))
        .await
        .unwrap();

    let content = CountingContent::new("replacement");
    let older = Leaf {
        modified_at: first - Duration::seconds(1),
        content: Box::new(content.clone()),
    };
    let outcome = write_local(&path, &older).await.unwrap();

    assert_eq!(outcome, WriteOutcome::Skipped);
    assert_eq!(content.opened(), 0, "skipped leaves must not be fetched");
    assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    assert_same_second(mtime(&path), first);
}

#[tokio::test]
async fn test_same_timestamp_is_skipped() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a");
    let modified_at = now() - Duration::minutes(5);

    write_local(&path, &static_leaf(modified_at, "v1"))
        .await
        .unwrap();
    let outcome = write_local(&path, &static_leaf(modified_at, "v2"))
        .await
        .unwrap();

    assert_eq!(outcome, WriteOutcome::Skipped);
    assert_eq!(fs::read_to_string(&path).unwrap(), "v1");
}

#[tokio::test]
async fn test_missing_parent_directories_are_created() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp
        .path()
        .join("a")
        .join("dir")
        .join("oh")
        .join("uh")
        .join("hi")
        .join("ho");

    let outcome = write_local(&path, &static_leaf(now(), "nested"))
        .await
        .unwrap();

    assert!(matches!(outcome, WriteOutcome::Written { .. }));
    assert!(temp.path().join("a/dir/oh/uh/hi").is_dir());
    assert_eq!(fs::read_to_string(&path).unwrap(), "nested");
}

#[tokio::test]
async fn test_writing_over_directory_fails() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("inside"), b"untouched").unwrap();

    let older_dir = now() - Duration::hours(1);
    filetime::set_file_mtime(
        &path,
        filetime::FileTime::from_system_time(older_dir.into()),
    )
    .unwrap();

    let result = write_local(&path, &static_leaf(now(), "test")).await;

    assert!(matches!(result, Err(MirrorError::Write { .. })));
    assert!(path.is_dir());
    assert_eq!(fs::read(path.join("inside")).unwrap(), b"untouched");
}

#[tokio::test]
async fn test_unreadable_destination_fails_before_writing() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("a");
    fs::write(&blocker, b"plain file").unwrap();

    // Looking up a/b fails with "not a directory", not "not found"
    let content = CountingContent::new("body");
    let leaf = Leaf {
        modified_at: now(),
        content: Box::new(content.clone()),
    };
    let result = write_local(&blocker.join("b"), &leaf).await;

    assert!(matches!(result, Err(MirrorError::Write { .. })));
    assert_eq!(content.opened(), 0);
    assert!(blocker.is_file());
    assert_eq!(fs::read(&blocker).unwrap(), b"plain file");
}

#[tokio::test]
async fn test_content_failure_aborts_write() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a");

    let leaf = Leaf {
        modified_at: now(),
        content: Box::new(FailingContent),
    };
    let result = write_local(&path, &leaf).await;

    match result {
        Err(MirrorError::Content { message, .. }) => assert_eq!(message, "remote went away"),
        other => panic!("Expected Content error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_new_file_opens_content_once() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("once");

    let content = CountingContent::new("body");
    let leaf = Leaf {
        modified_at: now(),
        content: Box::new(content.clone()),
    };
    write_local(&path, &leaf).await.unwrap();

    assert_eq!(content.opened(), 1);
}
