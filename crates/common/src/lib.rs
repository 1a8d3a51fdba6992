//! Penmark Common Library
//!
//! Shared data model, error type and configuration for the Penmark blog
//! front end.

pub mod config;
pub mod error;
pub mod fixtures;
pub mod types;

pub use config::{ApiConfig, PenmarkConfig, ProxyConfig, ServerConfig};
pub use error::{Error, Result};
pub use types::{Post, PostId, PostSummary};

/// Penmark version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".penmark")
        .join("config.toml")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
