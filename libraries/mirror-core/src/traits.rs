//! Core traits for Mirror

use crate::error::MirrorError;
use crate::types::Entry;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Source handler trait
///
/// Implementers expand one container entry into its children. Each call runs
/// on its own task; the engine drains the sink while the handler is still
/// producing, so pushes block until the engine is ready for them.
///
/// Returning from `expand` drops the sink, which is how the engine learns the
/// expansion is complete.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Expand `entry`, pushing children and errors into `sink` in any order
    async fn expand(&self, entry: Entry, sink: ExpandSink);
}

/// Maps an entry to the handler able to expand it
///
/// Must depend only on the entry's locator. `None` means the locator cannot
/// be routed, which the engine reports and skips.
pub trait Lookup: Send + Sync {
    /// Find a handler for `entry`
    fn lookup(&self, entry: &Entry) -> Option<Arc<dyn Handler>>;
}

impl<F> Lookup for F
where
    F: Fn(&Entry) -> Option<Arc<dyn Handler>> + Send + Sync,
{
    fn lookup(&self, entry: &Entry) -> Option<Arc<dyn Handler>> {
        self(entry)
    }
}

/// One item produced by a handler
#[derive(Debug)]
pub enum Expansion {
    /// A discovered child entry
    Child(Entry),
    /// A failure the handler wants reported
    Error(MirrorError),
}

/// Returned when the receiving side of a sink has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl fmt::Display for SinkClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expansion receiver closed")
    }
}

impl std::error::Error for SinkClosed {}

/// Ordered output of a single handler expansion
///
/// Children and errors share one channel so the engine sees them in the
/// order the handler produced them.
#[derive(Debug)]
pub struct ExpandSink {
    tx: mpsc::Sender<Expansion>,
}

impl ExpandSink {
    /// Create a sink and the receiver that drains it
    ///
    /// `capacity` is clamped to at least one slot.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Expansion>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Push a discovered child
    pub async fn child(&self, entry: Entry) -> Result<(), SinkClosed> {
        self.tx
            .send(Expansion::Child(entry))
            .await
            .map_err(|_| SinkClosed)
    }

    /// Push an error
    pub async fn error(&self, error: MirrorError) -> Result<(), SinkClosed> {
        self.tx
            .send(Expansion::Error(error))
            .await
            .map_err(|_| SinkClosed)
    }

    /// Whether the receiving side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    struct Nothing;

    #[async_trait]
    impl Handler for Nothing {
        async fn expand(&self, _entry: Entry, _sink: ExpandSink) {}
    }

    #[tokio::test]
    async fn test_sink_preserves_order() {
        let (sink, mut rx) = ExpandSink::channel(4);
        let url = Url::parse("test://host/a").unwrap();

        sink.child(Entry::container(url.clone())).await.unwrap();
        sink.error(MirrorError::NoHandler("x".into())).await.unwrap();
        sink.child(Entry::container(url)).await.unwrap();
        drop(sink);

        assert!(matches!(rx.recv().await, Some(Expansion::Child(_))));
        assert!(matches!(rx.recv().await, Some(Expansion::Error(_))));
        assert!(matches!(rx.recv().await, Some(Expansion::Child(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_sink_reports_closed_receiver() {
        let (sink, rx) = ExpandSink::channel(0);
        drop(rx);

        assert!(sink.is_closed());
        let url = Url::parse("test://host/a").unwrap();
        assert_eq!(sink.child(Entry::container(url)).await, Err(SinkClosed));
    }

    #[test]
    fn test_closure_lookup() {
        let lookup = |entry: &Entry| -> Option<Arc<dyn Handler>> {
            (entry.locator.scheme() == "test").then(|| Arc::new(Nothing) as Arc<dyn Handler>)
        };

        let routed = Entry::parse_container("test://host/").unwrap();
        let unrouted = Entry::parse_container("other://host/").unwrap();
        assert!(lookup.lookup(&routed).is_some());
        assert!(lookup.lookup(&unrouted).is_none());
    }
}
