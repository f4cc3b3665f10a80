//! Domain types: entries, leaves and their content

mod content;
mod entry;

pub use content::{ContentProducer, ContentReader, StaticContent};
pub use entry::{Entry, EntryKind, Leaf, Locator};
