//! Route handlers for the public API surface.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{Map, Value};

use crate::http::response::{
    map_upload_error, map_upstream_error, ActionContext, ApiError, UploadImageResponse,
    LOGIN_FIELDS_REQUIRED, UPLOAD_FIELDS_REQUIRED,
};
use crate::http::server::AppState;

/// Parse a request body as a JSON object. An empty body is `{}`.
fn parse_object(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected malformed request body");
            Err(ApiError::bad_request("Request body is not valid JSON"))
        }
    }
}

/// A field counts as present unless it is absent, null or an empty string.
fn required_field(fields: &Map<String, Value>, key: &str) -> Option<Value> {
    match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value.clone()),
    }
}

fn required_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

// Credentials are never logged.
#[tracing::instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = parse_object(&body)?;

    let (Some(mobile), Some(password)) = (
        required_field(&fields, "mobile"),
        required_field(&fields, "password"),
    ) else {
        return Err(ApiError::bad_request(LOGIN_FIELDS_REQUIRED));
    };

    let mut payload = Map::new();
    payload.insert("mobile".to_string(), mobile);
    payload.insert("password".to_string(), password);

    let result = state
        .actions
        .send("login", payload)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Login failed upstream");
            map_upstream_error(e, ActionContext::Login)
        })?;

    // Login responses are forwarded verbatim; no media resolution.
    Ok(Json(result))
}

#[tracing::instrument(name = "api_action", skip_all, fields(action = %action))]
pub async fn api_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let payload = parse_object(&body)?;

    let mut result = state.actions.send(&action, payload).await.map_err(|e| {
        tracing::error!(error = %e, "Action failed upstream");
        map_upstream_error(e, ActionContext::Action(&action))
    })?;

    if state.resolve_media && result.get("success") == Some(&Value::Bool(true)) {
        if let Some(data) = result.get_mut("data").filter(|d| !d.is_null()) {
            state.media.resolve(data).await;
        }
    }

    Ok(Json(result))
}

#[tracing::instrument(name = "upload_image", skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UploadImageResponse>, ApiError> {
    // Missing server credentials win over any body problem.
    state.uploader.ensure_configured().map_err(map_upload_error)?;

    let fields = parse_object(&body)?;
    let (Some(image), Some(file_name)) = (
        required_str(&fields, "image"),
        required_str(&fields, "fileName"),
    ) else {
        return Err(ApiError::bad_request(UPLOAD_FIELDS_REQUIRED));
    };

    let asset = state
        .uploader
        .upload(image, file_name)
        .await
        .map_err(map_upload_error)?;

    Ok(Json(UploadImageResponse {
        success: true,
        url: asset.url,
    }))
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
