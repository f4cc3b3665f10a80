//! Types for Tumblr API responses.

use serde::{Deserialize, Serialize};

/// Every API response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub meta: Option<Meta>,
    pub response: T,
}

/// Status block of the envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Meta {
    pub status: u16,
    pub msg: String,
}

/// Error envelope; `response` is often an empty array on failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub meta: Meta,
}

// =============================================================================
// Following
// =============================================================================

/// One page of `/v2/user/following`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FollowingPage {
    pub total_blogs: u32,
    #[serde(default)]
    pub blogs: Vec<FollowedBlog>,
}

/// A blog the user follows.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FollowedBlog {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub updated: Option<i64>,
}

impl FollowedBlog {
    /// Identifier used in blog endpoints: the blog's host, else its name.
    pub fn identifier(&self) -> String {
        self.url
            .as_deref()
            .and_then(|u| url::Url::parse(u).ok())
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.name.clone())
    }
}

// =============================================================================
// Posts
// =============================================================================

/// One page of `/v2/blog/{blog}/posts`.
///
/// Posts stay as raw JSON so the full record can be stored next to the
/// extracted content.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogPage {
    pub blog: Blog,
    #[serde(default)]
    pub posts: Vec<serde_json::Value>,
}

/// Blog info returned with every posts page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Blog {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Total number of posts on the blog
    pub posts: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub updated: Option<i64>,
}

/// Fields shared by every post type.
#[derive(Debug, Clone, Deserialize)]
pub struct PostHeader {
    pub id: i64,
    #[serde(rename = "type")]
    pub post_type: String,
    /// Unix timestamp (seconds) of the post
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextPost {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuotePost {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkPost {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoPost {
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Photo {
    #[serde(default)]
    pub alt_sizes: Vec<AltSize>,
}

/// One rendition of a photo; the first entry is the largest.
#[derive(Debug, Deserialize)]
pub(crate) struct AltSize {
    pub url: String,
}
