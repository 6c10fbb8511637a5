//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the media relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound request timeouts.
    pub timeouts: TimeoutConfig,

    /// Upstream relay behaviour.
    pub relay: UpstreamConfig,

    /// Catalog data sources and query limits.
    pub catalog: CatalogConfig,

    /// Cross-origin header injection.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce response headers, in seconds.
    /// Body streaming is not covered.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Upstream relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Maximum number of redirects followed before giving up.
    pub max_redirects: u32,

    /// Bound on connect + header receipt across the whole redirect chain.
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout per hop.
    pub connect_timeout_secs: u64,

    /// Maximum silence between two body chunks once streaming has begun.
    pub idle_timeout_secs: u64,

    /// User-Agent sent upstream.
    pub user_agent: String,

    /// Content-Type used when the upstream omits one.
    pub default_content_type: String,

    /// Honour HTTP(S)_PROXY environment variables for upstream requests.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            max_redirects: 5,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            idle_timeout_secs: 60,
            user_agent: "Mozilla/5.0".to_string(),
            default_content_type: "video/mp4".to_string(),
            use_system_proxy: false,
        }
    }
}

/// A category and the data file its records are read from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CategorySource {
    /// Category name as exposed through the API.
    pub name: String,

    /// File name, relative to `data_dir`.
    pub file: String,
}

impl CategorySource {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding the category data files.
    pub data_dir: String,

    /// Category value meaning "no category filter".
    pub all_category: String,

    /// Default and maximum page size for catalog queries.
    pub max_results: usize,

    /// Categories in display order.
    pub categories: Vec<CategorySource>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            all_category: "Todas".to_string(),
            max_results: 300,
            categories: vec![
                CategorySource::new("Español", "espanol.json"),
                CategorySource::new("Ingles", "ingles.json"),
                CategorySource::new("Frances", "frances.json"),
            ],
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Inject permissive CORS headers and answer preflight requests.
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
