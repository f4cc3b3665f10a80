//! HTTP client for the Tumblr v2 API.

use crate::config::TumblrConfig;
use crate::error::{Result, TumblrError};
use crate::types::{BlogPage, Envelope, ErrorEnvelope, FollowingPage};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Client for the parts of the Tumblr API the mirror reads.
///
/// # Example
///
/// ```ignore
/// use mirror_tumblr::{TumblrClient, TumblrConfig};
///
/// let client = TumblrClient::new(TumblrConfig::new("api-key"))?;
/// let page = client.posts("staff.tumblr.com", 0).await?;
/// println!("{} has {} posts", page.blog.name, page.blog.posts);
/// ```
#[derive(Debug, Clone)]
pub struct TumblrClient {
    http: Client,
    config: TumblrConfig,
}

impl TumblrClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TumblrConfig) -> Result<Self> {
        if config.api_base.is_empty() {
            return Err(TumblrError::InvalidUrl("URL cannot be empty".into()));
        }

        let api_base = config.api_base.trim_end_matches('/').to_string();
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(TumblrError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Mirror/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: TumblrConfig {
                api_base,
                ..config
            },
        })
    }

    /// Normalized API base URL.
    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    /// Underlying HTTP client, shared with media downloads.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// List one page of the blogs the authenticated user follows.
    ///
    /// Requires an access token.
    pub async fn following(&self, offset: u32) -> Result<FollowingPage> {
        let token = self
            .config
            .access_token
            .as_deref()
            .ok_or(TumblrError::AuthRequired)?;

        let url = format!("{}/v2/user/following", self.config.api_base);
        debug!(url = %url, offset, "Listing followed blogs");

        let request = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("offset", offset), ("limit", self.config.page_size)]);

        self.fetch(request).await
    }

    /// Fetch one page of a blog's posts in raw format.
    pub async fn posts(&self, blog: &str, offset: u32) -> Result<BlogPage> {
        let url = format!("{}/v2/blog/{}/posts", self.config.api_base, blog);
        debug!(url = %url, offset, "Fetching posts");

        let offset = offset.to_string();
        let limit = self.config.page_size.to_string();
        let request = self.http.get(&url).query(&[
            ("api_key", self.config.api_key.as_str()),
            ("filter", "raw"),
            ("offset", offset.as_str()),
            ("limit", limit.as_str()),
        ]);

        self.fetch(request).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(api_error(status.as_u16(), response).await);
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            TumblrError::ParseError(format!("Failed to parse API response: {}", e))
        })?;

        if let Some(meta) = envelope.meta {
            if !(200..300).contains(&meta.status) {
                return Err(TumblrError::Api {
                    status: meta.status,
                    message: meta.msg,
                });
            }
        }

        Ok(envelope.response)
    }
}

/// Build an API error, preferring the envelope's message over the raw body.
async fn api_error(status: u16, response: Response) -> TumblrError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.meta.msg)
        .unwrap_or(body);

    TumblrError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_url() {
        let result = TumblrClient::new(TumblrConfig::new("k").with_api_base(""));
        assert!(matches!(result, Err(TumblrError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        let result = TumblrClient::new(TumblrConfig::new("k").with_api_base("api.tumblr.com"));
        assert!(matches!(result, Err(TumblrError::InvalidUrl(_))));
    }

    #[test]
    fn test_trims_trailing_slash() {
        let client =
            TumblrClient::new(TumblrConfig::new("k").with_api_base("http://localhost:8080/"))
                .unwrap();
        assert_eq!(client.api_base(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_following_without_token_needs_auth() {
        let client = TumblrClient::new(TumblrConfig::new("k")).unwrap();
        let result = client.following(0).await;
        assert!(matches!(result, Err(TumblrError::AuthRequired)));
    }
}
