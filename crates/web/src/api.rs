//! Blog API client
//!
//! Pages never reach for a global client: they are handed an
//! `Arc<dyn BlogApi>` and call through it. The HTTP implementation talks to
//! the backend; the static implementation serves a fixed post list.

use async_trait::async_trait;
use reqwest::{header::ACCEPT, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use penmark_common::{Error, Post, PostId, PostSummary, Result};

/// Data-fetching capability used by pages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlogApi: Send + Sync {
    /// List post summaries in backend order
    async fn blog_list(&self) -> Result<Vec<PostSummary>>;

    /// Fetch a single post
    async fn blog_post(&self, id: &PostId) -> Result<Post>;
}

/// Blog API over HTTP
#[derive(Debug, Clone)]
pub struct HttpBlogApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpBlogApi {
    /// Create a client for the API at `origin`
    pub fn new(origin: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(origin)
            .map_err(|e| Error::InvalidConfig(format!("api origin {origin:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!("api origin {origin:?} cannot be a base")));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(network)?;

        Ok(Self { client, base })
    }

    /// API origin
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").push("blog").extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, post: Option<&PostId>) -> Result<T> {
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(network)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = post {
                return Err(Error::NotFound {
                    kind: "post".to_string(),
                    id: id.to_string(),
                });
            }
        }
        if !status.is_success() {
            warn!("{} returned {}", url, status);
            return Err(Error::Upstream { status: status.as_u16() });
        }

        let bytes = resp.bytes().await.map_err(network)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode(format!("{url}: {e}")))
    }
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    async fn blog_list(&self) -> Result<Vec<PostSummary>> {
        self.get_json(self.endpoint(&[]), None).await
    }

    async fn blog_post(&self, id: &PostId) -> Result<Post> {
        // Dot segments would be normalized away and address the list instead.
        if matches!(id.as_str(), "." | "..") {
            return Err(Error::NotFound {
                kind: "post".to_string(),
                id: id.to_string(),
            });
        }
        self.get_json(self.endpoint(&[id.as_str()]), Some(id)).await
    }
}

fn network(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

/// Blog API over a fixed, in-memory post list
#[derive(Debug, Clone, Default)]
pub struct StaticBlogApi {
    posts: Vec<Post>,
}

impl StaticBlogApi {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    /// Serve the built-in fixture posts
    pub fn fixtures() -> Self {
        Self::new(penmark_common::fixtures::sample_posts())
    }
}

#[async_trait]
impl BlogApi for StaticBlogApi {
    async fn blog_list(&self) -> Result<Vec<PostSummary>> {
        Ok(self.posts.iter().map(Post::summary).collect())
    }

    async fn blog_post(&self, id: &PostId) -> Result<Post> {
        self.posts
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: "post".to_string(),
                id: id.to_string(),
            })
    }
}
