use chrono::{DateTime, Utc};
use mirror_core::MirrorError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Default capacity of every channel between handler, engine and caller.
/// One slot keeps the hand-off close to a rendezvous.
const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// What the local writer did with a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum WriteOutcome {
    /// Content was copied to disk
    Written { bytes: u64 },
    /// Local copy was already current
    Skipped,
}

/// A leaf that reached local storage (written or already current)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedFile {
    pub locator: Url,
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
    pub outcome: WriteOutcome,
}

/// Options for a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Capacity of the handler, success and error channels
    pub channel_capacity: usize,
    /// Cancels the run when triggered
    pub cancel: CancellationToken,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            cancel: CancellationToken::new(),
        }
    }
}

impl SyncOptions {
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// Everything a drained run produced, in arrival order
#[derive(Debug, Default)]
pub struct SyncReport {
    pub synced: Vec<SyncedFile>,
    pub errors: Vec<MirrorError>,
}

impl SyncReport {
    pub fn written(&self) -> impl Iterator<Item = &SyncedFile> {
        self.synced
            .iter()
            .filter(|f| matches!(f.outcome, WriteOutcome::Written { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SyncedFile> {
        self.synced
            .iter()
            .filter(|f| f.outcome == WriteOutcome::Skipped)
    }

    pub fn was_cancelled(&self) -> bool {
        self.errors.iter().any(|e| matches!(e, MirrorError::Cancelled))
    }

    pub fn summary(&self) -> SyncSummary {
        let bytes_written = self
            .synced
            .iter()
            .map(|f| match f.outcome {
                WriteOutcome::Written { bytes } => bytes,
                WriteOutcome::Skipped => 0,
            })
            .sum();

        SyncSummary {
            files_synced: self.synced.len(),
            files_written: self.written().count(),
            files_skipped: self.skipped().count(),
            bytes_written,
            errors_encountered: self.errors.len(),
        }
    }
}

/// Summary of a completed sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub files_synced: usize,
    pub files_written: usize,
    pub files_skipped: usize,
    pub bytes_written: u64,
    pub errors_encountered: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synced(name: &str, outcome: WriteOutcome) -> SyncedFile {
        SyncedFile {
            locator: Url::parse(&format!("test://host/{}", name)).unwrap(),
            path: PathBuf::from(name),
            modified_at: Utc::now(),
            outcome,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = SyncReport {
            synced: vec![
                synced("a", WriteOutcome::Written { bytes: 10 }),
                synced("b", WriteOutcome::Skipped),
                synced("c", WriteOutcome::Written { bytes: 5 }),
            ],
            errors: vec![MirrorError::NoHandler("test://host/x".into())],
        };

        let summary = report.summary();
        assert_eq!(summary.files_synced, 3);
        assert_eq!(summary.files_written, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.bytes_written, 15);
        assert_eq!(summary.errors_encountered, 1);
        assert!(!report.was_cancelled());
    }

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert_eq!(options.channel_capacity, 1);
        assert!(!options.cancel.is_cancelled());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(WriteOutcome::Written { bytes: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "written", "bytes": 3 }));

        let json = serde_json::to_value(WriteOutcome::Skipped).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "skipped" }));
    }
}
