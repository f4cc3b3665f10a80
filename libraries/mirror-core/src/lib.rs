//! Mirror Core
//!
//! Source-agnostic types, traits, and error handling for Mirror.
//!
//! This crate provides the building blocks shared by the sync engine and by
//! every remote source handler.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Entry`, `EntryKind`, `Leaf`, `StaticContent`
//! - **Core Traits**: `Handler`, `Lookup`, `ContentProducer`
//! - **Error Handling**: Unified `MirrorError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use mirror_core::{Entry, StaticContent};
//!
//! // The root of a traversal is always a container
//! let root = Entry::parse_container("tumblr://dashboard/").unwrap();
//! assert!(root.is_container());
//!
//! // A leaf carries a timestamp and a lazily opened body
//! let post = Entry::leaf(
//!     "tumblr://dashboard/staff.tumblr.com/42.md".parse().unwrap(),
//!     Utc::now(),
//!     StaticContent::new("hello"),
//! );
//! assert!(post.is_leaf());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{MirrorError, Result};
pub use traits::{ExpandSink, Expansion, Handler, Lookup, SinkClosed};
pub use types::{ContentProducer, ContentReader, Entry, EntryKind, Leaf, Locator, StaticContent};
