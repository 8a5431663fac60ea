//! Upstream action client.
//!
//! # Responsibilities
//! - POST `{action, ...payload}` to the single configured endpoint
//! - Read the body as text, then parse it as JSON
//! - Classify failures as malformed, upstream failure, or transport

use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::upstream::types::{action_body, snippet, UpstreamError, UpstreamResult};

/// Client for the upstream action endpoint.
#[derive(Clone)]
pub struct ActionClient {
    http: Client,
    endpoint: String,
}

impl ActionClient {
    /// Create a client for `endpoint` with a per-call timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one action and return the parsed JSON body.
    ///
    /// No retries are attempted.
    #[tracing::instrument(name = "upstream_action", skip(self, payload), fields(action = %action))]
    pub async fn send(&self, action: &str, payload: Map<String, Value>) -> UpstreamResult<Value> {
        let result = self.send_inner(action, payload).await;
        match &result {
            Ok(_) => metrics::record_upstream_call("success"),
            Err(e) => metrics::record_upstream_call(e.kind()),
        }
        result
    }

    async fn send_inner(&self, action: &str, payload: Map<String, Value>) -> UpstreamResult<Value> {
        let body = action_body(action, payload);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Upstream request failed");
                UpstreamError::Transport(e)
            })?;
        let status = response.status();

        // Never trust the content type; read text and try to parse it.
        let text = response.text().await?;
        let parsed: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(%status, error = %e, "Upstream returned non-JSON body");
                return Err(UpstreamError::MalformedResponse {
                    status,
                    snippet: snippet(&text),
                });
            }
        };

        if !status.is_success() {
            tracing::warn!(%status, "Upstream returned error status");
            return Err(UpstreamError::UpstreamFailure {
                status,
                body: parsed,
            });
        }

        tracing::debug!(%status, "Upstream call succeeded");
        Ok(parsed)
    }
}

impl std::fmt::Debug for ActionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
