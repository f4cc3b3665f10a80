//! Error types for the Tumblr source.

use mirror_core::MirrorError;
use thiserror::Error;

/// Errors that can occur when reading from the Tumblr API.
#[derive(Error, Debug)]
pub enum TumblrError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Endpoint needs an OAuth access token but none is configured
    #[error("Authentication required: no access token configured")]
    AuthRequired,

    /// Invalid API base URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Post type the handler does not know how to store
    #[error("Unknown post type '{post_type}' for post {id}")]
    UnknownPostType { id: i64, post_type: String },

    /// Locator does not address the dashboard or a single blog
    #[error("Unsupported locator: {0}")]
    UnsupportedLocator(String),
}

impl From<serde_json::Error> for TumblrError {
    fn from(err: serde_json::Error) -> Self {
        TumblrError::ParseError(err.to_string())
    }
}

impl From<TumblrError> for MirrorError {
    fn from(err: TumblrError) -> Self {
        MirrorError::remote(err)
    }
}

/// Result type for Tumblr operations.
pub type Result<T> = std::result::Result<T, TumblrError>;
