//! Shared setup for page tests: tracing, fixture data and fake APIs.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use penmark_common::{Post, PostId, PostSummary, Result};
use penmark_web::{BlogApi, StaticBlogApi};

/// Install a test-friendly subscriber once per test binary
pub fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Fixture post list
pub fn fake_posts() -> Vec<Post> {
    penmark_common::fixtures::sample_posts()
}

pub fn fixture_api() -> Arc<dyn BlogApi> {
    setup();
    Arc::new(StaticBlogApi::new(fake_posts()))
}

/// Posts built from titles, with ids 1..=n
pub fn posts_titled(titles: &[&str]) -> Vec<Post> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| Post {
            id: PostId::from((i + 1) as u64),
            title: title.to_string(),
            body: format!("Body of {title}"),
            published_at: None,
        })
        .collect()
}

/// API whose list call never completes
pub struct PendingApi;

#[async_trait]
impl BlogApi for PendingApi {
    async fn blog_list(&self) -> Result<Vec<PostSummary>> {
        std::future::pending().await
    }

    async fn blog_post(&self, _id: &PostId) -> Result<Post> {
        std::future::pending().await
    }
}

/// Fixture API that counts list calls
#[derive(Default)]
pub struct CountingApi {
    inner: StaticBlogApi,
    pub list_calls: AtomicUsize,
}

impl CountingApi {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            inner: StaticBlogApi::new(posts),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlogApi for CountingApi {
    async fn blog_list(&self) -> Result<Vec<PostSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.blog_list().await
    }

    async fn blog_post(&self, id: &PostId) -> Result<Post> {
        self.inner.blog_post(id).await
    }
}
