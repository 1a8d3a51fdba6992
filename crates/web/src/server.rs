//! Web server implementation

use crate::api::{BlogApi, HttpBlogApi, StaticBlogApi};
use crate::api_proxy::ApiProxy;
use crate::assets;
use crate::pages;
use crate::routes::{render_route, Route};
use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::StreamExt;
use penmark_common::{PenmarkConfig, PostId};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const HTML: &str = "text/html; charset=utf-8";

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<WebServerState>,
}

struct WebServerState {
    cfg: PenmarkConfig,
    api: Arc<dyn BlogApi>,
    proxy: ApiProxy,
}

/// Build and run a server from config
pub async fn serve(addr: SocketAddr, cfg: PenmarkConfig) -> anyhow::Result<()> {
    let server = WebServer::from_config(cfg)?;
    server.serve(addr, shutdown_signal()).await
}

impl WebServer {
    /// Create a server that renders pages through `api`
    pub fn new(cfg: PenmarkConfig, api: Arc<dyn BlogApi>) -> penmark_common::Result<Self> {
        cfg.validate()?;
        let proxy = ApiProxy::new(&cfg.proxy)?;
        Ok(Self {
            state: Arc::new(WebServerState { cfg, api, proxy }),
        })
    }

    /// Create a server with the API implementation the config asks for
    pub fn from_config(cfg: PenmarkConfig) -> penmark_common::Result<Self> {
        let api: Arc<dyn BlogApi> = if cfg.server.fixtures {
            info!("Serving built-in fixture posts");
            Arc::new(StaticBlogApi::fixtures())
        } else {
            info!("Blog API at {}", cfg.api_origin());
            Arc::new(HttpBlogApi::new(cfg.api_origin(), cfg.api_timeout())?)
        };

        Self::new(cfg, api)
    }

    /// Active configuration
    pub fn config(&self) -> &PenmarkConfig {
        &self.state.cfg
    }

    /// Create router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/assets/*file", get(asset_handler))
            .route("/", get(index_handler))
            .route("/posts/:id", get(post_handler))
            .fallback(page_handler)
            .layer(middleware::from_fn_with_state(self.state.clone(), proxy_layer))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server, stopping when `shutdown` resolves
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            "Penmark listening on http://{} (proxy {} -> {})",
            listener.local_addr()?,
            self.state.proxy.prefix(),
            self.state.proxy.target()
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Web server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "penmark-web",
        "version": penmark_common::VERSION,
    }))
}

async fn asset_handler(Path(file): Path<String>) -> Response {
    assets::serve(&file)
}

/// Sends every path under the proxy prefix upstream, ahead of the page routes
async fn proxy_layer(
    State(state): State<Arc<WebServerState>>,
    req: Request,
    next: Next,
) -> Response {
    if state.proxy.matches(req.uri().path()) {
        state.proxy.forward(req).await
    } else {
        next.run(req).await
    }
}

/// Streams the chrome and welcome banner first, then the post list once the
/// API call resolves.
async fn index_handler(State(state): State<Arc<WebServerState>>) -> Response {
    let api = state.api.clone();

    let head = futures::stream::once(async { Ok::<_, Infallible>(pages::index_head()) });
    let rest = futures::stream::once(async move {
        let result = api.blog_list().await;
        if let Err(e) = &result {
            warn!("Failed to load post list: {}", e);
        }
        Ok::<_, Infallible>(format!("{}{}", pages::index_posts(&result), pages::index_tail()))
    });

    (
        [(header::CONTENT_TYPE, HTML)],
        Body::from_stream(head.chain(rest)),
    )
        .into_response()
}

async fn post_handler(
    State(state): State<Arc<WebServerState>>,
    Path(id): Path<String>,
) -> Response {
    let page = render_route(state.api.as_ref(), &Route::Post(PostId::new(id))).await;
    (page.status, [(header::CONTENT_TYPE, HTML)], page.html).into_response()
}

async fn page_handler(State(state): State<Arc<WebServerState>>, uri: Uri) -> Response {
    match Route::resolve(uri.path()) {
        Route::Index => index_handler(State(state)).await,
        route => {
            let page = render_route(state.api.as_ref(), &route).await;
            (page.status, [(header::CONTENT_TYPE, HTML)], page.html).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBlogApi;
    use penmark_common::{Error, PostSummary};
    use tower::ServiceExt;

    fn server_with(api: impl BlogApi + 'static) -> WebServer {
        WebServer::new(PenmarkConfig::default(), Arc::new(api)).unwrap()
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = server_with(StaticBlogApi::default()).router();
        let (status, body) = get_body(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_index_streams_full_page() {
        let app = server_with(StaticBlogApi::fixtures()).router();
        let (status, body) = get_body(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Welcome</h1>"));
        assert!(body.contains(r#"href="/posts/1""#));
        assert!(body.trim_end().ends_with("</html>"));
    }

    #[tokio::test]
    async fn test_index_fetch_failure_shows_banner() {
        let mut mock = MockBlogApi::new();
        mock.expect_blog_list()
            .returning(|| Err(Error::Network("connection refused".into())));

        let (status, body) = get_body(server_with(mock).router(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome"));
        assert!(body.contains("Posts could not be loaded."));
    }

    #[tokio::test]
    async fn test_post_and_not_found_routes() {
        let app = server_with(StaticBlogApi::fixtures()).router();

        let (status, body) = get_body(app.clone(), "/posts/1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>First post</h1>"));

        let (status, _) = get_body(app.clone(), "/posts/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_body(app.clone(), "/posts/1/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>First post</h1>"));

        let (status, body) = get_body(app, "/no/such/page").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));
    }

    #[tokio::test]
    async fn test_index_does_not_load_markdown_chunk() {
        let app = server_with(StaticBlogApi::fixtures()).router();
        let (_, index) = get_body(app.clone(), "/").await;
        let (_, post) = get_body(app, "/posts/1").await;
        assert!(!index.contains("/assets/markdown.css"));
        assert!(post.contains("/assets/markdown.css"));
    }

    #[tokio::test]
    async fn test_assets_served() {
        let app = server_with(StaticBlogApi::default()).router();
        let (status, body) = get_body(app.clone(), "/assets/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("data-link"));

        let (status, _) = get_body(app, "/assets/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_refetches_on_each_request() {
        let mut mock = MockBlogApi::new();
        mock.expect_blog_list().times(2).returning(|| {
            Ok(vec![PostSummary {
                id: PostId::from(1u64),
                title: "Only".into(),
                excerpt: String::new(),
            }])
        });
        let app = server_with(mock).router();

        let (_, first) = get_body(app.clone(), "/").await;
        let (_, second) = get_body(app, "/").await;
        assert_eq!(first, second);
    }

    async fn spawn_echo_backend() -> String {
        let app = Router::new().fallback(|uri: Uri| async move { format!("proxied {}", uri) });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_proxy_matches_by_path_prefix() {
        let mut cfg = PenmarkConfig::default();
        cfg.proxy.target = spawn_echo_backend().await;
        let app = WebServer::new(cfg, Arc::new(StaticBlogApi::fixtures())).unwrap().router();

        for path in ["/api", "/api/blog", "/apiv2/blog", "/api-docs"] {
            let (status, body) = get_body(app.clone(), path).await;
            assert_eq!(status, StatusCode::OK, "{path}");
            assert_eq!(body, format!("proxied {path}"));
        }

        let (status, body) = get_body(app, "/posts/1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>First post</h1>"));
    }

    #[test]
    fn test_reserved_proxy_prefix_rejected() {
        for prefix in ["/posts", "/assets", "/health", "/a"] {
            let mut cfg = PenmarkConfig::default();
            cfg.proxy.prefix = prefix.into();
            assert!(
                WebServer::new(cfg, Arc::new(StaticBlogApi::default())).is_err(),
                "{prefix}"
            );
        }
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut cfg = PenmarkConfig::default();
        cfg.proxy.target = "nonsense".into();
        assert!(WebServer::from_config(cfg).is_err());
    }

    #[tokio::test]
    async fn test_from_config_fixture_mode() {
        let mut cfg = PenmarkConfig::default();
        cfg.server.fixtures = true;
        let app = WebServer::from_config(cfg).unwrap().router();
        let (_, body) = get_body(app, "/").await;
        assert!(body.contains("First post"));
    }
}
