//! Response envelope and error mapping.
//!
//! # Responsibilities
//! - Define the uniform `{success, data?, error?, details?}` envelope
//! - Map component errors to HTTP statuses at the router boundary
//!
//! # Design Decisions
//! - Upstream JSON error bodies are forwarded as-is with the upstream status
//! - Diagnostic detail goes into `details`; nothing else leaks

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assets::UploadError;
use crate::upstream::UpstreamError;

/// Error message for `/login` without credentials.
pub const LOGIN_FIELDS_REQUIRED: &str = "Mobile and password required";

/// Error message for `/upload-image` without `image` or `fileName`.
pub const UPLOAD_FIELDS_REQUIRED: &str = "Image and fileName required";

/// Uniform JSON response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Envelope {
    /// A failed envelope; `success=false` always carries an error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Body of a successful `/upload-image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadImageResponse {
    pub success: bool,
    pub url: String,
}

/// Error returned by handlers; renders as JSON with its status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    /// Wrap an envelope.
    pub fn envelope(status: StatusCode, envelope: Envelope) -> Self {
        let body = serde_json::to_value(envelope).unwrap_or(Value::Null);
        Self { status, body }
    }

    /// Forward an upstream body untouched.
    pub fn passthrough(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// 400 with an error envelope.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::envelope(StatusCode::BAD_REQUEST, Envelope::error(message))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Which upstream call failed, for error wording.
#[derive(Debug, Clone, Copy)]
pub enum ActionContext<'a> {
    Login,
    Action(&'a str),
}

impl fmt::Display for ActionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionContext::Login => write!(f, "login"),
            ActionContext::Action(name) => write!(f, "action '{}'", name),
        }
    }
}

/// Keep upstream error statuses; anything else becomes 502.
pub fn error_status_or_bad_gateway(status: StatusCode) -> StatusCode {
    if status.is_client_error() || status.is_server_error() {
        status
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// Map an upstream failure to the response sent to the browser.
pub fn map_upstream_error(err: UpstreamError, context: ActionContext<'_>) -> ApiError {
    match err {
        UpstreamError::MalformedResponse { status, snippet } => ApiError::envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            Envelope::error(format!(
                "Upstream returned a non-JSON response during {}.",
                context
            ))
            .with_details(format!("upstream status {}: {}", status.as_u16(), snippet)),
        ),
        UpstreamError::UpstreamFailure { status, body } => {
            let status = error_status_or_bad_gateway(status);
            if body.is_object() {
                ApiError::passthrough(status, body)
            } else {
                ApiError::envelope(
                    status,
                    Envelope::error(format!(
                        "Upstream responded with status {} during {}.",
                        status.as_u16(),
                        context
                    ))
                    .with_data(body),
                )
            }
        }
        UpstreamError::Transport(e) => ApiError::envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            Envelope::error(format!("Proxy server error during {}.", context))
                .with_details(e.to_string()),
        ),
    }
}

/// Map an upload failure to the response sent to the browser.
pub fn map_upload_error(err: UploadError) -> ApiError {
    match err {
        UploadError::NotConfigured { missing } => ApiError::envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            Envelope::error("Server configuration error: image upload is not configured.")
                .with_details(format!("missing asset host settings: {}", missing.join(", "))),
        ),
        UploadError::InvalidInput(message) => ApiError::bad_request(message),
        UploadError::RemoteFailure { status, message } => ApiError::envelope(
            error_status_or_bad_gateway(status),
            Envelope::error(format!("Failed to upload image: {}", message)),
        ),
        UploadError::Transport(e) => ApiError::envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            Envelope::error("Proxy server error during image upload.").with_details(e.to_string()),
        ),
    }
}
