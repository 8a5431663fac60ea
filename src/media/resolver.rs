//! Payload media resolver.
//!
//! Walks a JSON tree and replaces every `PhotoURL` string that starts with
//! `http://` or `https://` by a `data:<mime>;base64,<bytes>` URI of the
//! fetched resource. Fetch failures leave the URL in place and are only
//! logged; resolution never fails the surrounding request.
//!
//! The walk first collects mutable references to every candidate slot and
//! then fetches them with at most `concurrency` requests in flight. A
//! replaced value is always a string, so nothing new needs walking after a
//! replacement. Input must be acyclic, which JSON always is.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

use crate::config::MediaConfig;
use crate::observability::metrics;

/// The only key inspected for media.
pub const PHOTO_KEY: &str = "PhotoURL";

/// MIME type used when the image host omits `content-type`.
pub const DEFAULT_MIME: &str = "image/jpeg";

/// True for absolute `http://` / `https://` URLs.
pub fn is_remote_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Encode `bytes` as a data URI.
pub fn data_uri(mime: Option<&str>, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime.unwrap_or(DEFAULT_MIME),
        STANDARD.encode(bytes)
    )
}

/// Collect every `PhotoURL` value that is a remote URL, depth-first.
pub fn collect_photo_slots<'a>(value: &'a mut Value, slots: &mut Vec<&'a mut Value>) {
    match value {
        Value::Array(items) => {
            for item in items.iter_mut() {
                collect_photo_slots(item, slots);
            }
        }
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == PHOTO_KEY && child.as_str().is_some_and(is_remote_url) {
                    slots.push(child);
                } else {
                    collect_photo_slots(child, slots);
                }
            }
        }
        _ => {}
    }
}

/// Fetches `PhotoURL` images and inlines them.
#[derive(Clone, Debug)]
pub struct MediaResolver {
    http: Client,
    concurrency: usize,
    budget: Duration,
}

impl MediaResolver {
    /// Build a resolver with the configured per-fetch timeout and fan-out.
    pub fn new(config: &MediaConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            concurrency: config.concurrency.max(1),
            budget: Duration::from_secs(config.total_timeout_secs),
        })
    }

    /// Resolve every candidate in `value`, in place, within the configured
    /// total budget.
    pub async fn resolve(&self, value: &mut Value) {
        let mut slots = Vec::new();
        collect_photo_slots(value, &mut slots);
        if slots.is_empty() {
            return;
        }

        tracing::debug!(count = slots.len(), concurrency = self.concurrency, "Resolving media");

        let total = slots.len();
        let fetches = stream::iter(slots)
            .for_each_concurrent(self.concurrency, |slot| self.resolve_slot(slot));

        // Replacements already written stay; unfinished slots keep their URL.
        if tokio::time::timeout(self.budget, fetches).await.is_err() {
            tracing::warn!(
                count = total,
                budget_secs = self.budget.as_secs(),
                "Media resolution budget exhausted; returning partial payload"
            );
            metrics::record_media_fetch("budget_exhausted");
        }
    }

    async fn resolve_slot(&self, slot: &mut Value) {
        let url = match slot.as_str() {
            Some(url) => url.to_string(),
            None => return,
        };
        if let Some(encoded) = self.fetch_data_uri(&url).await {
            *slot = Value::String(encoded);
        }
    }

    async fn fetch_data_uri(&self, url: &str) -> Option<String> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Image fetch failed");
                metrics::record_media_fetch("transport");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, %status, "Image fetch returned non-success status");
            metrics::record_media_fetch("http_error");
            return None;
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        match response.bytes().await {
            Ok(bytes) => {
                metrics::record_media_fetch("success");
                Some(data_uri(mime.as_deref(), &bytes))
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Image body read failed");
                metrics::record_media_fetch("transport");
                None
            }
        }
    }
}
