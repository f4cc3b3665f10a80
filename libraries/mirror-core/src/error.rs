//! Core error types for Mirror

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `MirrorError`
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Core error type for Mirror
///
/// Only `InvalidLocator` on the traversal root aborts a run. Every other
/// variant describes a single entry and is reported while the traversal
/// carries on.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// A locator string could not be parsed
    #[error("Invalid locator '{locator}': {source}")]
    InvalidLocator {
        /// The string that failed to parse
        locator: String,
        /// Why it failed
        #[source]
        source: url::ParseError,
    },

    /// No handler is registered for the locator
    #[error("Cannot sync {0}: no handler for locator")]
    NoHandler(String),

    /// The locator path does not name a file inside the destination root
    #[error("Refusing to write {0}: path does not name a file under the destination root")]
    UnsafePath(String),

    /// Local filesystem failure while writing a leaf
    #[error("Write failed for {}: {source}", .path.display())]
    Write {
        /// Local path being written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A leaf's content could not be opened
    #[error("Content unavailable for {locator}: {message}")]
    Content {
        /// Locator of the leaf whose content failed
        locator: String,
        /// What went wrong
        message: String,
    },

    /// Error reported by a remote source handler
    #[error("Remote source error: {0}")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A handler task panicked while expanding a container
    #[error("Handler for {0} panicked")]
    HandlerPanicked(String),

    /// The run was cancelled before the worklist was exhausted
    #[error("Sync was cancelled")]
    Cancelled,
}

impl MirrorError {
    /// Create an invalid locator error
    pub fn invalid_locator(locator: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidLocator {
            locator: locator.into(),
            source,
        }
    }

    /// Create a write error for a local path
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a content error
    pub fn content(locator: impl ToString, message: impl Into<String>) -> Self {
        Self::Content {
            locator: locator.to_string(),
            message: message.into(),
        }
    }

    /// Wrap an error produced by a remote source
    pub fn remote<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Remote(Box::new(err))
    }

    /// Whether this error ends the whole run rather than a single entry
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidLocator { .. } | Self::Cancelled)
    }
}
