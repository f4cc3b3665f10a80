use crate::types::{SyncOptions, SyncReport, SyncedFile};
use crate::writer::{rebase, write_local};
use mirror_core::{Entry, EntryKind, ExpandSink, Expansion, Lookup, MirrorError, Result};
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The two result streams of a running sync
///
/// Both receivers must be drained concurrently: the engine blocks on every
/// send, so a caller reading only one of them stalls the run. Both close
/// once the worklist is exhausted or the run is cancelled.
pub struct SyncStreams {
    /// Leaves that are on disk and current, in the order they were processed
    pub synced: mpsc::Receiver<SyncedFile>,
    /// Per-entry failures, in the order they were reported
    pub errors: mpsc::Receiver<MirrorError>,
    handle: JoinHandle<()>,
}

impl SyncStreams {
    /// Drain both streams to completion and collect everything they carried
    pub async fn drain(self) -> SyncReport {
        self.drain_with(|_| {}, |_| {}).await
    }

    /// Like [`drain`](Self::drain), calling back on each item as it arrives
    pub async fn drain_with<S, E>(mut self, mut on_synced: S, mut on_error: E) -> SyncReport
    where
        S: FnMut(&SyncedFile),
        E: FnMut(&MirrorError),
    {
        let mut report = SyncReport::default();
        let mut synced_open = true;
        let mut errors_open = true;

        while synced_open || errors_open {
            tokio::select! {
                file = self.synced.recv(), if synced_open => match file {
                    Some(file) => {
                        on_synced(&file);
                        report.synced.push(file);
                    }
                    None => synced_open = false,
                },
                error = self.errors.recv(), if errors_open => match error {
                    Some(error) => {
                        on_error(&error);
                        report.errors.push(error);
                    }
                    None => errors_open = false,
                },
            }
        }

        if let Err(e) = self.handle.await {
            if e.is_panic() {
                std::panic::resume_unwind(e.into_panic());
            }
        }

        report
    }
}

/// Mirror everything reachable from `source_root` into `destination_root`
///
/// Returns immediately with the result streams; the traversal runs on a
/// background task. The only error returned here is a malformed
/// `source_root`, in which case nothing is started.
pub fn sync(
    source_root: &str,
    destination_root: impl Into<PathBuf>,
    lookup: impl Lookup + 'static,
) -> Result<SyncStreams> {
    sync_with_options(source_root, destination_root, lookup, SyncOptions::default())
}

/// [`sync`] with explicit channel capacity and cancellation
pub fn sync_with_options(
    source_root: &str,
    destination_root: impl Into<PathBuf>,
    lookup: impl Lookup + 'static,
    options: SyncOptions,
) -> Result<SyncStreams> {
    let root = Entry::parse_container(source_root)?;
    let capacity = options.channel_capacity.max(1);

    let (synced_tx, synced) = mpsc::channel(capacity);
    let (errors_tx, errors) = mpsc::channel(capacity);

    let engine = Engine {
        destination: destination_root.into(),
        lookup: Box::new(lookup),
        synced_tx,
        errors_tx,
        cancel: options.cancel,
        capacity,
    };
    let handle = tokio::spawn(engine.run(root));

    Ok(SyncStreams {
        synced,
        errors,
        handle,
    })
}

/// Why a run stopped before the worklist was empty
enum Halt {
    Cancelled,
    Disconnected,
}

struct Engine {
    destination: PathBuf,
    lookup: Box<dyn Lookup>,
    synced_tx: mpsc::Sender<SyncedFile>,
    errors_tx: mpsc::Sender<MirrorError>,
    cancel: CancellationToken,
    capacity: usize,
}

impl Engine {
    async fn run(self, root: Entry) {
        info!(
            root = %root.locator,
            destination = %self.destination.display(),
            "Starting sync"
        );

        // FIFO: containers found while expanding one item go behind
        // everything already pending.
        let mut worklist = VecDeque::from([root]);
        let mut expanded = 0usize;

        let outcome = loop {
            let Some(entry) = worklist.pop_front() else {
                break Ok(());
            };
            if self.cancel.is_cancelled() {
                break Err(Halt::Cancelled);
            }

            expanded += 1;
            if let Err(halt) = self.process(entry, &mut worklist).await {
                break Err(halt);
            }
        };

        match outcome {
            Ok(()) => info!(containers = expanded, "Sync complete"),
            Err(Halt::Cancelled) => {
                warn!(pending = worklist.len(), "Sync cancelled");
                let _ = self.errors_tx.send(MirrorError::Cancelled).await;
            }
            Err(Halt::Disconnected) => {
                warn!(pending = worklist.len(), "Result receiver dropped, stopping sync");
            }
        }
    }

    /// Expand one worklist item with its handler
    async fn process(
        &self,
        entry: Entry,
        worklist: &mut VecDeque<Entry>,
    ) -> std::result::Result<(), Halt> {
        let Some(handler) = self.lookup.lookup(&entry) else {
            warn!(locator = %entry.locator, "No handler for locator");
            return self
                .report(MirrorError::NoHandler(entry.locator.to_string()))
                .await;
        };

        debug!(locator = %entry.locator, "Expanding");
        let locator = entry.locator.to_string();
        let (sink, mut expansion) = ExpandSink::channel(self.capacity);
        let mut task = tokio::spawn(async move { handler.expand(entry, sink).await });

        loop {
            let item = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    task.abort();
                    return Err(Halt::Cancelled);
                }
                item = expansion.recv() => item,
            };

            let routed = match item {
                Some(Expansion::Child(child)) => self.route(child, worklist).await,
                Some(Expansion::Error(error)) => self.report(error).await,
                None => break,
            };
            if let Err(halt) = routed {
                task.abort();
                return Err(halt);
            }
        }

        let joined = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                task.abort();
                return Err(Halt::Cancelled);
            }
            joined = &mut task => joined,
        };

        match joined {
            Err(e) if e.is_panic() => {
                warn!(locator = %locator, "Handler panicked");
                self.report(MirrorError::HandlerPanicked(locator)).await
            }
            _ => Ok(()),
        }
    }

    /// Queue a container or write a leaf
    async fn route(
        &self,
        child: Entry,
        worklist: &mut VecDeque<Entry>,
    ) -> std::result::Result<(), Halt> {
        let Entry { locator, kind } = child;

        let leaf = match kind {
            EntryKind::Container => {
                debug!(locator = %locator, "Queued container");
                worklist.push_back(Entry::container(locator));
                return Ok(());
            }
            EntryKind::Leaf(leaf) => leaf,
        };

        let path = match rebase(&self.destination, &locator) {
            Ok(path) => path,
            Err(e) => {
                warn!(locator = %locator, error = %e, "Cannot place leaf");
                return self.report(e).await;
            }
        };

        match write_local(&path, &leaf).await {
            Ok(outcome) => {
                let file = SyncedFile {
                    locator,
                    path,
                    modified_at: leaf.modified_at,
                    outcome,
                };
                self.emit(&self.synced_tx, file).await
            }
            Err(e) => {
                warn!(locator = %locator, error = %e, "Failed to write leaf");
                self.report(e).await
            }
        }
    }

    /// Send a per-entry error
    ///
    /// A caller that dropped only the error stream loses the failure and
    /// nothing else; the run stops only once the synced stream is gone too.
    async fn report(&self, error: MirrorError) -> std::result::Result<(), Halt> {
        match self.emit(&self.errors_tx, error).await {
            Err(Halt::Disconnected) if !self.synced_tx.is_closed() => {
                debug!("Error receiver dropped, continuing");
                Ok(())
            }
            sent => sent,
        }
    }

    async fn emit<T>(&self, tx: &mpsc::Sender<T>, value: T) -> std::result::Result<(), Halt> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Halt::Cancelled),
            sent = tx.send(value) => sent.map_err(|_| Halt::Disconnected),
        }
    }
}
