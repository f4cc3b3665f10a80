//! Lazily opened leaf content

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::io::Cursor;
use tokio::io::AsyncRead;

/// Readable byte stream returned by a [`ContentProducer`]
pub type ContentReader = Box<dyn AsyncRead + Send + Unpin>;

/// Opens the body of a leaf on demand
///
/// The engine calls `open` at most once per leaf, and only when the local
/// copy is missing or older than the remote one.
#[async_trait]
pub trait ContentProducer: Send + Sync {
    /// Open a reader over the leaf's content
    async fn open(&self) -> Result<ContentReader>;
}

/// Content already held in memory
#[derive(Clone)]
pub struct StaticContent(Bytes);

impl StaticContent {
    /// Create content from anything convertible into bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// Length of the content in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the content is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for StaticContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticContent")
            .field("len", &self.0.len())
            .finish()
    }
}

#[async_trait]
impl ContentProducer for StaticContent {
    async fn open(&self) -> Result<ContentReader> {
        Ok(Box::new(Cursor::new(self.0.clone())))
    }
}
