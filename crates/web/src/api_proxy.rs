//! API proxy
//!
//! Forwards requests under the configured prefix to the blog backend so
//! the browser can call relative `/api` paths on the front-end origin.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderName, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, trace};
use url::Url;

use penmark_common::{Error, ProxyConfig, Result};

/// Largest request body forwarded upstream
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Connection-scoped headers that must not be forwarded
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Header names listed in `Connection`, which are connection-scoped too
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// End-to-end headers of `incoming`, without length and hop-by-hop headers
fn end_to_end(incoming: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(incoming);
    let mut headers = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if is_hop_by_hop(name) || name == header::CONTENT_LENGTH || listed.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Reverse proxy to the blog backend
#[derive(Debug, Clone)]
pub struct ApiProxy {
    client: reqwest::Client,
    target: Url,
    prefix: String,
    change_origin: bool,
}

impl ApiProxy {
    /// Create a proxy from config
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let target = Url::parse(&config.target)
            .map_err(|e| Error::InvalidConfig(format!("proxy target {:?}: {e}", config.target)))?;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            target,
            prefix: config.prefix.trim_end_matches('/').to_string(),
            change_origin: config.change_origin,
        })
    }

    /// Path prefix this proxy handles
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `path` is forwarded by this proxy
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Upstream origin
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Upstream URL for an incoming request URI
    pub fn upstream_url(&self, uri: &Uri) -> Url {
        let mut url = self.target.clone();
        let base = self.target.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", base, uri.path()));
        url.set_query(uri.query());
        url
    }

    fn upstream_headers(&self, incoming: &HeaderMap) -> HeaderMap {
        let mut headers = end_to_end(incoming);
        // Dropping Host lets the client fill in the target authority.
        if self.change_origin {
            headers.remove(header::HOST);
        }
        headers
    }

    /// Forward a request and relay the upstream response
    pub async fn forward(&self, req: Request) -> Response {
        let (parts, body) = req.into_parts();
        let url = self.upstream_url(&parts.uri);

        let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Rejecting proxied body: {}", e);
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        };

        debug!("Proxy {} {} -> {}", parts.method, parts.uri, url);

        let upstream = self
            .client
            .request(parts.method.clone(), url.clone())
            .headers(self.upstream_headers(&parts.headers))
            .body(body)
            .send()
            .await;

        let resp = match upstream {
            Ok(resp) => resp,
            Err(e) => {
                error!("Proxy request to {} failed: {}", url, e);
                return (StatusCode::BAD_GATEWAY, format!("Upstream unavailable: {}", self.target))
                    .into_response();
            }
        };

        let status = resp.status();
        let headers = end_to_end(resp.headers());

        trace!("Proxy {} <- {}", url, status);

        let mut response = Response::new(Body::from_stream(resp.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
