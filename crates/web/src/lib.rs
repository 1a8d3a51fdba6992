//! Penmark Web
//!
//! Server-rendered blog front end: lists posts from the blog API, renders
//! post detail pages, and proxies `/api` calls to the backend.

pub mod api;
pub mod api_proxy;
pub mod assets;
pub mod pages;
pub mod routes;
pub mod server;

pub use api::{BlogApi, HttpBlogApi, StaticBlogApi};
pub use api_proxy::ApiProxy;
pub use routes::{render_route, Link, MemoryRouter, RenderedPage, Route};
pub use server::WebServer;
