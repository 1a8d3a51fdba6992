//! Routing table and in-memory navigation
//!
//! `Route::resolve` is the single mapping from paths to pages; both the HTTP
//! server and [`MemoryRouter`] render through [`render_route`].

use axum::http::StatusCode;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

use penmark_common::{Error, PostId, Result};

use crate::api::BlogApi;
use crate::pages;

/// Path prefix of post detail routes
pub const POSTS_PREFIX: &str = "/posts/";

/// A resolved route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Index,
    /// `/posts/{id}`
    Post(PostId),
    /// Anything else, carrying the requested path
    NotFound(String),
}

impl Route {
    /// Resolve a request path (query string and fragment are ignored)
    pub fn resolve(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();

        if path.is_empty() || path == "/" {
            return Route::Index;
        }

        if let Some(rest) = path.strip_prefix(POSTS_PREFIX) {
            let segment = rest.strip_suffix('/').unwrap_or(rest);
            if !segment.is_empty() && !segment.contains('/') {
                if let Ok(decoded) = urlencoding::decode(segment) {
                    return Route::Post(PostId::new(decoded.into_owned()));
                }
            }
        }

        Route::NotFound(path.to_string())
    }

    /// Canonical path for this route
    pub fn path(&self) -> String {
        match self {
            Route::Index => "/".to_string(),
            Route::Post(id) => format!("{}{}", POSTS_PREFIX, urlencoding::encode(id.as_str())),
            Route::NotFound(path) => path.clone(),
        }
    }
}

/// A link found on a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    /// Accessible name (text content)
    pub name: String,
}

static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<a\s([^>]*)>(.*?)</a>"#).expect("anchor regex"));
static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]*)""#).expect("href regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<h[1-6][^>]*>(.*?)</h[1-6]>"#).expect("heading regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

fn text_content(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    pages::unescape(&collapsed)
}

/// Output of rendering a route
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: StatusCode,
    pub html: String,
}

impl RenderedPage {
    fn new(status: StatusCode, html: String) -> Self {
        Self { status, html }
    }

    /// Visible text of the page body
    pub fn text(&self) -> String {
        let body = self.html.split("<body>").nth(1).unwrap_or(&self.html);
        text_content(body)
    }

    /// Whether the page shows `needle` as text
    pub fn has_text(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    /// Links in document order
    pub fn links(&self) -> Vec<Link> {
        ANCHOR_RE
            .captures_iter(&self.html)
            .filter_map(|caps| {
                let href = HREF_RE.captures(&caps[1])?;
                Some(Link {
                    href: pages::unescape(&href[1]),
                    name: text_content(&caps[2]),
                })
            })
            .collect()
    }

    /// Heading texts in document order
    pub fn headings(&self) -> Vec<String> {
        HEADING_RE
            .captures_iter(&self.html)
            .map(|caps| text_content(&caps[1]))
            .collect()
    }
}

/// Render a route to HTML using `api` for data
pub async fn render_route(api: &dyn BlogApi, route: &Route) -> RenderedPage {
    match route {
        Route::Index => {
            let result = api.blog_list().await;
            if let Err(e) = &result {
                warn!("Failed to load post list: {}", e);
            }
            RenderedPage::new(StatusCode::OK, pages::index_page(&result))
        }
        Route::Post(id) => match api.blog_post(id).await {
            Ok(post) => RenderedPage::new(StatusCode::OK, pages::post_page(&post)),
            Err(e) if e.is_not_found() => {
                debug!("Post {} not found", id);
                RenderedPage::new(StatusCode::NOT_FOUND, pages::not_found_page(&route.path()))
            }
            Err(e) => {
                warn!("Failed to load post {}: {}", id, e);
                RenderedPage::new(
                    StatusCode::BAD_GATEWAY,
                    pages::error_page("The post could not be loaded."),
                )
            }
        },
        Route::NotFound(path) => {
            RenderedPage::new(StatusCode::NOT_FOUND, pages::not_found_page(path))
        }
    }
}

/// Router with in-memory history, for driving pages without a browser
pub struct MemoryRouter {
    api: Arc<dyn BlogApi>,
    entries: Vec<String>,
    index: usize,
}

impl MemoryRouter {
    /// Create a router whose current location is the last initial entry
    pub fn new<I, S>(api: Arc<dyn BlogApi>, initial_entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<String> = initial_entries.into_iter().map(Into::into).collect();
        if entries.is_empty() {
            entries.push("/".to_string());
        }
        let index = entries.len() - 1;
        Self { api, entries, index }
    }

    /// Current location
    pub fn location(&self) -> &str {
        &self.entries[self.index]
    }

    /// Current route
    pub fn route(&self) -> Route {
        Route::resolve(self.location())
    }

    /// Push a new location, discarding forward history
    pub fn navigate(&mut self, to: impl Into<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(to.into());
        self.index = self.entries.len() - 1;
    }

    /// Go back one entry; false if already at the start
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Go forward one entry; false if already at the end
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Render the current location
    pub async fn render(&self) -> RenderedPage {
        render_route(self.api.as_ref(), &self.route()).await
    }

    /// Follow the `nth` link named `name` on the current page and render the target
    pub async fn click_link(&mut self, name: &str, nth: usize) -> Result<RenderedPage> {
        let page = self.render().await;
        let link = page
            .links()
            .into_iter()
            .filter(|l| l.name == name)
            .nth(nth)
            .ok_or_else(|| Error::NotFound {
                kind: "link".to_string(),
                id: format!("{name}[{nth}] on {}", self.location()),
            })?;

        debug!("Following link {:?} -> {}", name, link.href);
        self.navigate(link.href);
        Ok(self.render().await)
    }
}
