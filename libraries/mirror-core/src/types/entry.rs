//! Location entries flowing through a traversal

use super::content::ContentProducer;
use crate::error::{MirrorError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

/// Hierarchical address (scheme, host, path) of an entry
pub type Locator = Url;

/// A single remote location discovered during traversal
///
/// Entries are created once, either as the traversal root or by a handler
/// while expanding another entry, and consumed exactly once by the engine.
pub struct Entry {
    /// Where the entry lives remotely
    pub locator: Locator,
    /// Container or leaf
    pub kind: EntryKind,
}

/// What an entry is: something to expand, or something to download
pub enum EntryKind {
    /// Needs to be expanded by a handler before it yields content
    Container,
    /// Directly downloadable
    Leaf(Leaf),
}

/// A downloadable entry's timestamp and content
pub struct Leaf {
    /// Last modification time reported by the remote source
    pub modified_at: DateTime<Utc>,
    /// Opens the entry's body when it needs to be written
    pub content: Box<dyn ContentProducer>,
}

impl Entry {
    /// Create a container entry
    pub fn container(locator: Locator) -> Self {
        Self {
            locator,
            kind: EntryKind::Container,
        }
    }

    /// Parse a locator string into a container entry
    pub fn parse_container(locator: &str) -> Result<Self> {
        let url = Url::parse(locator).map_err(|e| MirrorError::invalid_locator(locator, e))?;
        Ok(Self::container(url))
    }

    /// Create a leaf entry
    pub fn leaf(
        locator: Locator,
        modified_at: DateTime<Utc>,
        content: impl ContentProducer + 'static,
    ) -> Self {
        Self {
            locator,
            kind: EntryKind::Leaf(Leaf {
                modified_at,
                content: Box::new(content),
            }),
        }
    }

    /// Whether the entry still needs expanding
    pub fn is_container(&self) -> bool {
        matches!(self.kind, EntryKind::Container)
    }

    /// Whether the entry can be written locally
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, EntryKind::Leaf(_))
    }

    /// The leaf payload, if this entry is a leaf
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            EntryKind::Leaf(leaf) => Some(leaf),
            EntryKind::Container => None,
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Entry");
        s.field("locator", &self.locator.as_str());
        match &self.kind {
            EntryKind::Container => s.field("kind", &"container"),
            EntryKind::Leaf(leaf) => s
                .field("kind", &"leaf")
                .field("modified_at", &leaf.modified_at),
        };
        s.finish()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.locator)
    }
}
