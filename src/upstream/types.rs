//! Upstream protocol types and error definitions.

use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest raw-body excerpt carried by [`UpstreamError::MalformedResponse`].
pub const SNIPPET_LIMIT: usize = 500;

/// Errors that can occur while calling the upstream action endpoint.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with something that is not JSON.
    #[error("upstream returned a non-JSON response (status {status})")]
    MalformedResponse { status: StatusCode, snippet: String },

    /// Upstream answered with JSON and a non-2xx status.
    #[error("upstream responded with status {status}")]
    UpstreamFailure { status: StatusCode, body: Value },

    /// Connection refused, timeout, DNS, or a broken body stream.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::MalformedResponse { .. } => "malformed",
            UpstreamError::UpstreamFailure { .. } => "upstream_failure",
            UpstreamError::Transport(_) => "transport",
        }
    }
}

/// Result type for upstream calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Build the wire body `{action, ...payload}`.
///
/// The explicit action always wins over an `action` key in the payload.
pub fn action_body(action: &str, mut payload: Map<String, Value>) -> Value {
    payload.insert("action".to_string(), Value::String(action.to_string()));
    Value::Object(payload)
}

/// First [`SNIPPET_LIMIT`] characters of a raw body.
pub fn snippet(raw: &str) -> String {
    raw.chars().take(SNIPPET_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_body_merges_payload() {
        let payload = json!({"foo": "bar", "n": 1});
        let body = action_body("echo", payload.as_object().cloned().unwrap());
        assert_eq!(body, json!({"action": "echo", "foo": "bar", "n": 1}));
    }

    #[test]
    fn test_action_name_overrides_payload_action() {
        let payload = json!({"action": "deleteEverything"});
        let body = action_body("getItems", payload.as_object().cloned().unwrap());
        assert_eq!(body["action"], "getItems");
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let raw = "é".repeat(SNIPPET_LIMIT + 20);
        let cut = snippet(&raw);
        assert_eq!(cut.chars().count(), SNIPPET_LIMIT);

        assert_eq!(snippet("short"), "short");
    }
}
