//! Asset upload types, errors and naming rules.

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while uploading to the asset host.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Token, owner or repository is missing. No request was made.
    #[error("asset host is not configured (missing {})", .missing.join(", "))]
    NotConfigured { missing: Vec<&'static str> },

    /// Empty content, empty file name, or content that is not base64.
    #[error("invalid upload input: {0}")]
    InvalidInput(String),

    /// Asset host rejected the request or answered without a download URL.
    #[error("asset host responded with status {status}: {message}")]
    RemoteFailure { status: StatusCode, message: String },

    /// Network-level failure talking to the asset host.
    #[error("asset host transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UploadError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::NotConfigured { .. } => "not_configured",
            UploadError::InvalidInput(_) => "invalid_input",
            UploadError::RemoteFailure { .. } => "remote_failure",
            UploadError::Transport(_) => "transport",
        }
    }
}

/// A stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedAsset {
    /// Public download URL reported by the asset host.
    pub url: String,
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Collision-resistant storage name: `<millis>_<sanitized name>`.
pub fn storage_name(millis: u128, file_name: &str) -> String {
    format!("{}_{}", millis, sanitize_file_name(file_name))
}

/// Accept either bare base64 or a full `data:<mime>;base64,<data>` URI.
pub fn strip_data_uri_prefix(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("data:") {
        if let Some(idx) = trimmed.find(";base64,") {
            return &trimmed[idx + ";base64,".len()..];
        }
    }
    trimmed
}
