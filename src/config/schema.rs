//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the action proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Upstream action endpoint.
    pub upstream: UpstreamConfig,

    /// Asset host used by `/upload-image`.
    pub assets: AssetHostConfig,

    /// Media resolution applied to action responses.
    pub media: MediaConfig,

    /// Static files served on `/`, `/tools.json` and `/generator.json`.
    pub static_files: StaticFilesConfig,

    /// Inbound request handling limits.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` pair handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Upstream action endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Single POST target for every action. Required.
    pub url: Option<String>,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
        }
    }
}

/// Asset host (source-hosting contents API) configuration.
///
/// `token`, `owner` and `repo` are optional as a set: when any of them is
/// missing, uploads are disabled.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetHostConfig {
    /// Access token sent as `Authorization: token <value>`.
    pub token: Option<String>,

    /// Repository owner.
    pub owner: Option<String>,

    /// Repository name.
    pub repo: Option<String>,

    /// Optional target branch; the repository default is used when unset.
    pub branch: Option<String>,

    /// API base URL.
    pub api_base: String,

    /// Directory inside the repository that receives uploads.
    pub directory: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl AssetHostConfig {
    /// Names of the credential settings that are absent or blank.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.token) {
            missing.push("token");
        }
        if blank(&self.owner) {
            missing.push("owner");
        }
        if blank(&self.repo) {
            missing.push("repo");
        }
        missing
    }
}

impl Default for AssetHostConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            branch: None,
            api_base: "https://api.github.com".to_string(),
            directory: "images".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Media resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Inline `PhotoURL` images in successful `/api/{action}` responses.
    pub resolve_api_responses: bool,

    /// Maximum number of image fetches in flight for one payload.
    pub concurrency: usize,

    /// Per-image fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Budget in seconds for resolving one whole payload. Must stay below
    /// `server.request_timeout_secs`; images still pending when it runs out
    /// keep their URL.
    pub total_timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            resolve_api_responses: true,
            concurrency: 1,
            timeout_secs: 10,
            total_timeout_secs: 60,
        }
    }
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory holding `index.html`, `tools.json` and `generator.json`.
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "public".to_string(),
        }
    }
}

/// Inbound request handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Answer CORS preflights and allow any origin.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            max_body_bytes: 10 * 1024 * 1024, // base64 images
            cors: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "compact" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
