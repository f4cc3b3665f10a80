//! Lazily fetched remote content.

use async_trait::async_trait;
use futures_util::StreamExt;
use mirror_core::{ContentProducer, ContentReader, MirrorError, Result};
use reqwest::Client;
use std::io;
use tokio_util::io::StreamReader;
use tracing::debug;

/// Content fetched over HTTP when the writer opens it.
///
/// Nothing is requested until `open` is called, so leaves the writer skips
/// cost no download.
#[derive(Debug, Clone)]
pub struct HttpContent {
    http: Client,
    url: String,
}

impl HttpContent {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ContentProducer for HttpContent {
    async fn open(&self) -> Result<ContentReader> {
        debug!(url = %self.url, "Downloading content");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| MirrorError::content(&self.url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::content(
                &self.url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other));

        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }
}
