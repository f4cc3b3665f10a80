//! Expansion of Tumblr locators into containers and files.

use crate::client::TumblrClient;
use crate::config::TumblrConfig;
use crate::content::HttpContent;
use crate::error::{Result, TumblrError};
use crate::types::{LinkPost, PhotoPost, PostHeader, QuotePost, TextPost};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mirror_core::{Entry, ExpandSink, Handler, Locator, SinkClosed, StaticContent};
use tracing::{debug, info, warn};

/// Handler for `tumblr://` locators.
///
/// The root path lists followed blogs; a single-segment path is one blog.
#[derive(Debug, Clone)]
pub struct TumblrHandler {
    client: TumblrClient,
}

/// Why an expansion stopped early.
enum Stop {
    /// The engine stopped listening
    Closed,
    Failed(TumblrError),
}

impl From<SinkClosed> for Stop {
    fn from(_: SinkClosed) -> Self {
        Stop::Closed
    }
}

impl From<TumblrError> for Stop {
    fn from(err: TumblrError) -> Self {
        Stop::Failed(err)
    }
}

impl From<serde_json::Error> for Stop {
    fn from(err: serde_json::Error) -> Self {
        Stop::Failed(err.into())
    }
}

impl TumblrHandler {
    pub fn new(config: TumblrConfig) -> Result<Self> {
        Ok(Self {
            client: TumblrClient::new(config)?,
        })
    }

    pub fn with_client(client: TumblrClient) -> Self {
        Self { client }
    }

    async fn expand_following(
        &self,
        root: &Locator,
        sink: &ExpandSink,
    ) -> std::result::Result<(), Stop> {
        let mut offset = 0;
        loop {
            let page = self.client.following(offset).await?;
            let count = page.blogs.len();

            for blog in &page.blogs {
                let locator = child_locator(root, &blog.identifier());
                sink.child(Entry::container(locator)).await?;
            }

            offset += u32::try_from(count).unwrap_or(u32::MAX);
            if count == 0 || offset >= page.total_blogs {
                break;
            }
        }

        info!(root = %root, blogs = offset, "Listed followed blogs");
        Ok(())
    }

    async fn expand_blog(
        &self,
        locator: &Locator,
        blog: &str,
        sink: &ExpandSink,
    ) -> std::result::Result<(), Stop> {
        let mut offset = 0;
        loop {
            let page = self.client.posts(blog, offset).await?;
            let count = page.posts.len();

            for raw in page.posts {
                let header: PostHeader = serde_json::from_value(raw.clone())?;
                let modified_at = post_time(&header)?;

                // Metadata goes out before the post body is interpreted, so
                // even posts of unknown type keep their raw record.
                let metadata = serde_json::to_vec_pretty(&raw)?;
                sink.child(Entry::leaf(
                    child_locator(locator, &format!(".{}.json", header.id)),
                    modified_at,
                    StaticContent::new(metadata),
                ))
                .await?;

                for entry in self.post_entries(locator, &header, modified_at, raw)? {
                    sink.child(entry).await?;
                }
            }

            offset += u32::try_from(count).unwrap_or(u32::MAX);
            if count == 0 || offset >= page.blog.posts {
                break;
            }
        }

        info!(blog = %blog, posts = offset, "Expanded blog");
        Ok(())
    }

    /// Files holding the content of one post, by post type.
    fn post_entries(
        &self,
        blog: &Locator,
        header: &PostHeader,
        modified_at: DateTime<Utc>,
        raw: serde_json::Value,
    ) -> Result<Vec<Entry>> {
        let id = header.id;
        let text_leaf = |name: String, body: String| {
            Entry::leaf(
                child_locator(blog, &name),
                modified_at,
                StaticContent::new(body),
            )
        };

        let entries = match header.post_type.as_str() {
            "text" => {
                let post: TextPost = serde_json::from_value(raw)?;
                vec![text_leaf(format!("{}.md", id), post.body)]
            }
            "quote" => {
                let post: QuotePost = serde_json::from_value(raw)?;
                vec![text_leaf(format!("{}_quote.txt", id), post.text)]
            }
            "link" => {
                let post: LinkPost = serde_json::from_value(raw)?;
                vec![text_leaf(format!("{}_link.txt", id), post.url)]
            }
            "photo" => {
                let post: PhotoPost = serde_json::from_value(raw)?;
                post.photos
                    .iter()
                    .enumerate()
                    .filter_map(|(index, photo)| {
                        let url = &photo.alt_sizes.first()?.url;
                        let name = format!("{}-{}.{}", id, index, extension(url));
                        Some(Entry::leaf(
                            child_locator(blog, &name),
                            modified_at,
                            HttpContent::new(self.client.http().clone(), url.as_str()),
                        ))
                    })
                    .collect()
            }
            // Stored as metadata only
            "answer" | "audio" | "chat" | "video" => Vec::new(),
            other => {
                return Err(TumblrError::UnknownPostType {
                    id,
                    post_type: other.to_string(),
                })
            }
        };

        Ok(entries)
    }
}

#[async_trait]
impl Handler for TumblrHandler {
    async fn expand(&self, entry: Entry, sink: ExpandSink) {
        let locator = entry.locator;
        let segments: Vec<String> = locator
            .path_segments()
            .map(|s| s.filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        debug!(locator = %locator, "Expanding Tumblr locator");

        let result = match segments.as_slice() {
            [] => self.expand_following(&locator, &sink).await,
            [blog] => self.expand_blog(&locator, blog, &sink).await,
            _ => Err(Stop::Failed(TumblrError::UnsupportedLocator(
                locator.to_string(),
            ))),
        };

        match result {
            Ok(()) => {}
            Err(Stop::Closed) => debug!(locator = %locator, "Engine stopped listening"),
            Err(Stop::Failed(err)) => {
                warn!(locator = %locator, error = %err, "Tumblr expansion failed");
                // Receiver gone means the run is over; nothing left to tell.
                let _ = sink.error(err.into()).await;
            }
        }
    }
}

/// Locator for `name` directly under `parent`.
fn child_locator(parent: &Locator, name: &str) -> Locator {
    let mut locator = parent.clone();
    locator.set_path(&format!("{}/{}", parent.path().trim_end_matches('/'), name));
    locator.set_query(None);
    locator
}

fn post_time(header: &PostHeader) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(header.timestamp, 0).ok_or_else(|| {
        TumblrError::ParseError(format!(
            "post {} has out of range timestamp {}",
            header.id, header.timestamp
        ))
    })
}

/// File extension of a media URL, `jpg` when it has none.
fn extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_locator_appends_segment() {
        let root = Locator::parse("tumblr://dashboard/").unwrap();
        let blog = child_locator(&root, "staff.tumblr.com");
        assert_eq!(blog.as_str(), "tumblr://dashboard/staff.tumblr.com");

        let file = child_locator(&blog, ".42.json");
        assert_eq!(file.as_str(), "tumblr://dashboard/staff.tumblr.com/.42.json");
    }

    #[test]
    fn test_extension_from_media_url() {
        assert_eq!(extension("https://64.media.tumblr.com/abc/tumblr_x_1280.png"), "png");
        assert_eq!(extension("https://example.com/a/b.gif?size=large"), "gif");
        assert_eq!(extension("https://example.com/a/noext"), "jpg");
        assert_eq!(extension("https://example.com/a/.hidden"), "jpg");
    }

    #[test]
    fn test_post_time_uses_seconds() {
        let header = PostHeader {
            id: 1,
            post_type: "text".into(),
            timestamp: 1_500_000_000,
        };
        assert_eq!(post_time(&header).unwrap().timestamp(), 1_500_000_000);
    }
}
