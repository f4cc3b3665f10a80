//! Configuration for the Tumblr source.

use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_API_BASE: &str = "https://api.tumblr.com";
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Configuration for reaching the Tumblr API.
///
/// Passed to the handler at construction; tests point `api_base` at a mock
/// server instead of rebinding anything global.
#[derive(Clone, Serialize, Deserialize)]
pub struct TumblrConfig {
    /// Base URL of the API (e.g., "https://api.tumblr.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Consumer key used for public blog endpoints
    #[serde(default)]
    pub api_key: String,
    /// OAuth access token for user endpoints (followed blogs)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Number of posts or blogs requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl TumblrConfig {
    /// Create a config for the public API with just an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: default_api_base(),
            api_key: api_key.into(),
            access_token: None,
            page_size: default_page_size(),
        }
    }

    /// Use a different API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Add an OAuth access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Change the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for TumblrConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for TumblrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TumblrConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &redact(&self.api_key))
            .field(
                "access_token",
                &self.access_token.as_deref().map(redact),
            )
            .field("page_size", &self.page_size)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
