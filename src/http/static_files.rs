//! Fixed static files: `/`, `/tools.json`, `/generator.json`.

use std::io;
use std::path::PathBuf;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;

const HTML: &str = "text/html; charset=utf-8";
const JSON: &str = "application/json";

/// Reads files from the configured static root.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(name)).await
    }
}

/// Closest HTTP status for a filesystem error.
pub fn io_error_status(err: &io::Error) -> StatusCode {
    match err.kind() {
        io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn index(State(state): State<AppState>) -> Response {
    match state.static_files.read("index.html").await {
        Ok(bytes) => ([(header::CONTENT_TYPE, HTML)], bytes).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read index.html");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading index.html").into_response()
        }
    }
}

pub async fn tools_json(State(state): State<AppState>) -> Response {
    serve_json(&state.static_files, "tools.json").await
}

pub async fn generator_json(State(state): State<AppState>) -> Response {
    serve_json(&state.static_files, "generator.json").await
}

async fn serve_json(files: &StaticFiles, name: &str) -> Response {
    match files.read(name).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, JSON)], bytes).into_response(),
        Err(e) => {
            let status = io_error_status(&e);
            tracing::error!(file = name, %status, error = %e, "Failed to read static file");
            (status, format!("Error loading {}: {}", name, e)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_status() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(io_error_status(&not_found), StatusCode::NOT_FOUND);

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "no");
        assert_eq!(io_error_status(&denied), StatusCode::FORBIDDEN);

        let other = io::Error::new(io::ErrorKind::Other, "disk on fire");
        assert_eq!(io_error_status(&other), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_reads_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tools.json"), br#"{"tools":[]}"#).unwrap();

        let files = StaticFiles::new(dir.path());
        assert_eq!(files.read("tools.json").await.unwrap(), br#"{"tools":[]}"#.to_vec());
        assert!(files.read("generator.json").await.is_err());
    }
}
