//! Local writer: newer-wins copy of a single leaf onto disk

use crate::types::WriteOutcome;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use mirror_core::{Leaf, MirrorError, Result};
use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// Map a remote locator onto a path under `destination`
///
/// Each path segment of the locator is percent-decoded and becomes one path
/// component. Locators whose path is empty, climbs out of the root with `..`,
/// or decodes to a separator or NUL inside a segment are rejected.
pub fn rebase(destination: &Path, locator: &Url) -> Result<PathBuf> {
    let unsafe_path = || MirrorError::UnsafePath(locator.to_string());
    let mut path = destination.to_path_buf();
    let mut depth = 0usize;

    for raw in locator.path_segments().into_iter().flatten() {
        let segment = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| unsafe_path())?;

        match segment.as_ref() {
            "" | "." => {}
            ".." => return Err(unsafe_path()),
            s if s.contains(['/', '\\', '\0']) => return Err(unsafe_path()),
            s => {
                path.push(s);
                depth += 1;
            }
        }
    }

    if depth == 0 {
        return Err(unsafe_path());
    }

    Ok(path)
}

/// Write `leaf` to `path` unless the local copy is already current
///
/// The leaf is written when nothing exists at `path` or when the leaf's
/// modification time is strictly newer than the local file's. Timestamps are
/// compared at whole-second precision because some filesystems drop the
/// sub-second part. After a write both atime and mtime are set to the leaf's
/// timestamp and the file is synced to disk.
///
/// A failed write is not cleaned up; a partially copied file may remain.
pub async fn write_local(path: &Path, leaf: &Leaf) -> Result<WriteOutcome> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => {
            return Err(MirrorError::write(
                path,
                io::Error::new(io::ErrorKind::Other, "destination is a directory"),
            ));
        }
        Ok(metadata) => {
            let local = metadata.modified().map_err(|e| MirrorError::write(path, e))?;
            if !is_newer(leaf.modified_at, local) {
                debug!(path = %path.display(), "Local copy is current");
                return Ok(WriteOutcome::Skipped);
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(MirrorError::write(path, e)),
    }

    let bytes = copy_to_disk(path, leaf).await?;
    debug!(path = %path.display(), bytes, "Wrote file");

    Ok(WriteOutcome::Written { bytes })
}

fn is_newer(remote: DateTime<Utc>, local: SystemTime) -> bool {
    let local: DateTime<Utc> = local.into();
    remote.timestamp() > local.timestamp()
}

async fn copy_to_disk(path: &Path, leaf: &Leaf) -> Result<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| MirrorError::write(parent, e))?;
    }

    let mut file = fs::File::create(path)
        .await
        .map_err(|e| MirrorError::write(path, e))?;

    let mut reader = leaf.content.open().await?;
    let bytes = tokio::io::copy(&mut reader, &mut file)
        .await
        .map_err(|e| MirrorError::write(path, e))?;
    file.flush().await.map_err(|e| MirrorError::write(path, e))?;

    let file = file.into_std().await;
    let time = FileTime::from_system_time(leaf.modified_at.into());
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        filetime::set_file_handle_times(&file, Some(time), Some(time))?;
        file.sync_all()
    })
    .await
    .map_err(|e| MirrorError::write(path, io::Error::new(io::ErrorKind::Other, e)))?
    .map_err(|e| MirrorError::write(path, e))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_rebase_joins_segments() {
        let path = rebase(Path::new("/backup"), &url("tumblr://dash/blog/42.md")).unwrap();
        assert_eq!(path, PathBuf::from("/backup/blog/42.md"));
    }

    #[test]
    fn test_rebase_skips_empty_segments() {
        let path = rebase(Path::new("out"), &url("test://host//a/./b")).unwrap();
        assert_eq!(path, PathBuf::from("out/a/b"));
    }

    #[test]
    fn test_rebase_rejects_root() {
        let result = rebase(Path::new("out"), &url("test://host/"));
        assert!(matches!(result, Err(MirrorError::UnsafePath(_))));
    }

    #[test]
    fn test_rebase_decodes_spaces() {
        let path = rebase(Path::new("out"), &url("test://host/my file.txt")).unwrap();
        assert_eq!(path, PathBuf::from("out/my file.txt"));
    }

    #[test]
    fn test_rebase_decodes_utf8_names() {
        let path = rebase(Path::new("out"), &url("test://host/blog/café.txt")).unwrap();
        assert_eq!(path, PathBuf::from("out/blog/café.txt"));
    }

    #[test]
    fn test_rebase_rejects_encoded_separators() {
        for locator in [
            "test://host/a%2Fb.txt",
            "test://host/a%5Cb.txt",
            "test://host/a%00b.txt",
        ] {
            let result = rebase(Path::new("out"), &url(locator));
            assert!(
                matches!(result, Err(MirrorError::UnsafePath(_))),
                "{} should be refused",
                locator
            );
        }
    }

    #[test]
    fn test_rebase_rejects_invalid_utf8() {
        let result = rebase(Path::new("out"), &url("test://host/%FF.txt"));
        assert!(matches!(result, Err(MirrorError::UnsafePath(_))));
    }

    #[test]
    fn test_rebase_stays_under_destination() {
        let path = rebase(Path::new("out"), &url("test://host/a/../../etc/passwd")).unwrap();
        assert_eq!(path, PathBuf::from("out/etc/passwd"));
    }

    #[test]
    fn test_is_newer_ignores_subsecond_difference() {
        let local = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(100);
        let remote = DateTime::from_timestamp(100, 900_000_000).unwrap();
        assert!(!is_newer(remote, local));

        let remote = DateTime::from_timestamp(101, 0).unwrap();
        assert!(is_newer(remote, local));

        let remote = DateTime::from_timestamp(99, 0).unwrap();
        assert!(!is_newer(remote, local));
    }
}
