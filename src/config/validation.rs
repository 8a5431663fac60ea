//! Configuration validation.
//!
//! Serde handles syntax; this checks semantics. Every problem is reported,
//! not just the first one.

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream url is required (set SCRIPT_URL)")]
    MissingUpstreamUrl,

    #[error("upstream url '{0}' is not a valid http(s) URL")]
    InvalidUpstreamUrl(String),

    #[error("asset api base '{0}' is not a valid http(s) URL")]
    InvalidAssetApiBase(String),

    #[error("listener port must be non-zero")]
    ZeroPort,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("media.total_timeout_secs ({media}) must be below server.request_timeout_secs ({request})")]
    MediaBudgetTooLong { media: u64, request: u64 },
}

/// Validate a fully layered configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.upstream.url.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingUpstreamUrl),
        Some(raw) if !is_http_url(raw) => {
            errors.push(ValidationError::InvalidUpstreamUrl(raw.to_string()))
        }
        Some(_) => {}
    }

    if !is_http_url(&config.assets.api_base) {
        errors.push(ValidationError::InvalidAssetApiBase(
            config.assets.api_base.clone(),
        ));
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    let non_zero = [
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        ("assets.timeout_secs", config.assets.timeout_secs),
        ("media.timeout_secs", config.media.timeout_secs),
        ("media.concurrency", config.media.concurrency as u64),
        ("media.total_timeout_secs", config.media.total_timeout_secs),
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("server.max_body_bytes", config.server.max_body_bytes as u64),
    ];
    for (name, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(name));
        }
    }

    if config.media.total_timeout_secs >= config.server.request_timeout_secs {
        errors.push(ValidationError::MediaBudgetTooLong {
            media: config.media.total_timeout_secs,
            request: config.server.request_timeout_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
