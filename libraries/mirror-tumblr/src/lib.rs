//! Mirror Tumblr Source
//!
//! Handler that expands Tumblr locators for the Mirror sync engine.
//!
//! # Locators
//!
//! - `tumblr://<any-host>/` - the blogs the authenticated user follows; each
//!   becomes a container
//! - `tumblr://<any-host>/<blog>` - every post of one blog, written as
//!   `<blog>/.<id>.json` metadata plus one file per post body or photo
//!
//! # Example
//!
//! ```ignore
//! use mirror_sync::Registry;
//! use mirror_tumblr::{TumblrConfig, TumblrHandler};
//! use std::sync::Arc;
//!
//! let config = TumblrConfig::new("my-api-key").with_access_token("oauth-token");
//! let handler = TumblrHandler::new(config)?;
//! let registry = Registry::new().with_scheme("tumblr", Arc::new(handler));
//!
//! let report = mirror_sync::sync("tumblr://dashboard/", "./backup", registry)?
//!     .drain()
//!     .await;
//! println!("{} files synced", report.synced.len());
//! ```

mod client;
mod config;
mod content;
mod error;
mod handler;
mod types;

// Re-export main types
pub use client::TumblrClient;
pub use config::TumblrConfig;
pub use content::HttpContent;
pub use error::{Result, TumblrError};
pub use handler::TumblrHandler;
pub use types::{Blog, BlogPage, FollowedBlog, FollowingPage, PostHeader};
