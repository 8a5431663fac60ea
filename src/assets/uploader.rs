//! Asset uploader for the source-hosting contents API.
//!
//! # Responsibilities
//! - Refuse to run without token, owner and repository
//! - Derive a timestamped, sanitized storage name
//! - PUT the base64 content and return the public download URL

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::assets::types::{storage_name, strip_data_uri_prefix, UploadError, UploadedAsset};
use crate::config::AssetHostConfig;
use crate::observability::metrics;
use crate::upstream::types::snippet;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Borrowed view of a complete credential set.
struct Credentials<'a> {
    token: &'a str,
    owner: &'a str,
    repo: &'a str,
}

/// Body of a contents-API create request.
#[derive(Serialize)]
struct CreateContentRequest<'a> {
    message: String,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Uploads base64 content to the asset host.
#[derive(Clone)]
pub struct AssetUploader {
    http: Client,
    config: AssetHostConfig,
}

impl AssetUploader {
    /// Build an uploader. Succeeds even when credentials are missing; uploads
    /// then fail with [`UploadError::NotConfigured`].
    pub fn new(config: AssetHostConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// True when token, owner and repository are all present.
    pub fn is_configured(&self) -> bool {
        self.config.missing_credentials().is_empty()
    }

    /// Fail fast with [`UploadError::NotConfigured`] when credentials are incomplete.
    pub fn ensure_configured(&self) -> Result<(), UploadError> {
        self.credentials().map(|_| ())
    }

    fn credentials(&self) -> Result<Credentials<'_>, UploadError> {
        let missing = self.config.missing_credentials();
        match (&self.config.token, &self.config.owner, &self.config.repo) {
            (Some(token), Some(owner), Some(repo)) if missing.is_empty() => Ok(Credentials {
                token: token.trim(),
                owner: owner.trim(),
                repo: repo.trim(),
            }),
            _ => Err(UploadError::NotConfigured { missing }),
        }
    }

    /// Contents-API URL for `name` inside the configured directory.
    fn content_url(&self, creds: &Credentials<'_>, name: &str) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        let dir = self.config.directory.trim_matches('/');
        if dir.is_empty() {
            format!("{}/repos/{}/{}/contents/{}", base, creds.owner, creds.repo, name)
        } else {
            format!(
                "{}/repos/{}/{}/contents/{}/{}",
                base, creds.owner, creds.repo, dir, name
            )
        }
    }

    /// Upload `base64_content` under a name derived from `file_name`.
    #[tracing::instrument(name = "asset_upload", skip(self, base64_content), fields(file_name = %file_name))]
    pub async fn upload(
        &self,
        base64_content: &str,
        file_name: &str,
    ) -> Result<UploadedAsset, UploadError> {
        let result = self.upload_inner(base64_content, file_name).await;
        match &result {
            Ok(_) => metrics::record_upload("success"),
            Err(e) => metrics::record_upload(e.kind()),
        }
        result
    }

    async fn upload_inner(
        &self,
        base64_content: &str,
        file_name: &str,
    ) -> Result<UploadedAsset, UploadError> {
        let creds = self.credentials()?;

        let content = strip_data_uri_prefix(base64_content);
        if content.is_empty() {
            return Err(UploadError::InvalidInput("image content is empty".into()));
        }
        if file_name.trim().is_empty() {
            return Err(UploadError::InvalidInput("file name is empty".into()));
        }

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let name = storage_name(millis, file_name.trim());
        let url = self.content_url(&creds, &name);

        let body = CreateContentRequest {
            message: format!("Upload image {}", name),
            content,
            branch: self.config.branch.as_deref(),
        };

        let response = self
            .http
            .put(&url)
            .header(AUTHORIZATION, format!("token {}", creds.token))
            .header(ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Asset host request failed");
                UploadError::Transport(e)
            })?;
        let status = response.status();
        let text = response.text().await?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        let download_url = parsed
            .as_ref()
            .and_then(|v| v.pointer("/content/download_url"))
            .and_then(Value::as_str);

        match download_url {
            Some(url) if status.is_success() => {
                tracing::info!(%status, name = %name, "Asset uploaded");
                Ok(UploadedAsset {
                    url: url.to_string(),
                })
            }
            _ => {
                let message = parsed
                    .as_ref()
                    .and_then(|v| v.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        if status.is_success() {
                            "response did not include a download URL".to_string()
                        } else {
                            snippet(&text)
                        }
                    });
                tracing::warn!(%status, message = %message, "Asset host rejected upload");
                Err(UploadError::RemoteFailure { status, message })
            }
        }
    }
}

impl std::fmt::Debug for AssetUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token.
        f.debug_struct("AssetUploader")
            .field("api_base", &self.config.api_base)
            .field("owner", &self.config.owner)
            .field("repo", &self.config.repo)
            .field("configured", &self.is_configured())
            .finish()
    }
}
