//! Penmark configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default backend origin the dev proxy forwards to
pub const DEFAULT_BACKEND: &str = "http://localhost:5088";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenmarkConfig {
    /// HTTP listener
    pub server: ServerConfig,

    /// API proxy
    pub proxy: ProxyConfig,

    /// Blog API client
    pub api: ApiConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen: String,

    /// Serve built-in fixture posts instead of calling the backend
    pub fixtures: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5173".to_string(),
            fixtures: false,
        }
    }
}

/// Dev-server proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Path prefix forwarded to the backend
    pub prefix: String,

    /// Backend origin
    pub target: String,

    /// Rewrite the Host header to the target's authority
    pub change_origin: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
            target: DEFAULT_BACKEND.to_string(),
            change_origin: true,
        }
    }
}

/// Blog API client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin of the blog API; falls back to the proxy target
    pub origin: Option<String>,

    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            origin: None,
            timeout_ms: 10_000,
        }
    }
}

/// Paths served by the application itself, never proxied
pub const RESERVED_PATHS: &[&str] = &["/posts", "/assets", "/health"];

impl PenmarkConfig {
    /// Load configuration from file, or defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that addresses and URLs parse
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if !self.proxy.prefix.starts_with('/') || self.proxy.prefix.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "proxy prefix must start with '/' and name a path: {:?}",
                self.proxy.prefix
            )));
        }

        let prefix = self.proxy.prefix.trim_end_matches('/');
        if let Some(path) = RESERVED_PATHS
            .iter()
            .find(|path| path.starts_with(prefix) || prefix.starts_with(**path))
        {
            return Err(Error::InvalidConfig(format!(
                "proxy prefix {:?} overlaps application path {}",
                self.proxy.prefix, path
            )));
        }

        let origins = [
            ("proxy.target", self.proxy.target.as_str()),
            ("api.origin", self.api_origin()),
        ];
        for (name, origin) in origins {
            let parsed = url::Url::parse(origin)
                .map_err(|e| Error::InvalidConfig(format!("{name}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be http or https: {origin}"
                )));
            }
        }

        if self.api.timeout_ms == 0 {
            return Err(Error::InvalidConfig("api.timeout_ms must be positive".into()));
        }

        Ok(())
    }

    /// Parsed listen address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("server.listen {:?}: {e}", self.server.listen)))
    }

    /// Origin the blog API client talks to
    pub fn api_origin(&self) -> &str {
        self.api.origin.as_deref().unwrap_or(&self.proxy.target)
    }

    /// API request timeout
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }
}
