//! Mirror Sync
//!
//! Incrementally mirrors a remote, hierarchically organised source onto local
//! storage. A worklist of containers is expanded one at a time by pluggable
//! handlers; every leaf they discover is written to disk when it is new or
//! newer than the local copy.

mod engine;
mod registry;
mod types;
mod writer;

// Public exports
pub use engine::{sync, sync_with_options, SyncStreams};
pub use mirror_core::{MirrorError, Result};
pub use registry::Registry;
pub use types::{SyncOptions, SyncReport, SyncSummary, SyncedFile, WriteOutcome};
pub use writer::{rebase, write_local};
