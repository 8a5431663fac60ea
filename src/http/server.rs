//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the outbound clients from the validated config
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS)
//! - Serve until a shutdown signal arrives

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::assets::AssetUploader;
use crate::config::ProxyConfig;
use crate::http::handlers::{api_action, health, login, not_found, upload_image};
use crate::http::request::{RequestSpan, UuidRequestId};
use crate::http::static_files::{generator_json, index, tools_json, StaticFiles};
use crate::lifecycle::signals::shutdown_signal;
use crate::media::MediaResolver;
use crate::observability::metrics;
use crate::upstream::ActionClient;

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("upstream url is not configured")]
    MissingUpstream,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
///
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub actions: Arc<ActionClient>,
    pub uploader: Arc<AssetUploader>,
    pub media: Arc<MediaResolver>,
    pub resolve_media: bool,
    pub static_files: Arc<StaticFiles>,
}

impl AppState {
    /// Build every component from the configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerError> {
        let endpoint = config
            .upstream
            .url
            .clone()
            .ok_or(ServerError::MissingUpstream)?;

        let actions = ActionClient::new(
            endpoint,
            Duration::from_secs(config.upstream.timeout_secs),
        )?;
        let uploader = AssetUploader::new(config.assets.clone())?;
        let media = MediaResolver::new(&config.media)?;

        Ok(Self {
            actions: Arc::new(actions),
            uploader: Arc::new(uploader),
            media: Arc::new(media),
            resolve_media: config.media.resolve_api_responses,
            static_files: Arc::new(StaticFiles::new(&config.static_files.root)),
        })
    }
}

/// HTTP server for the action proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;

        if !state.uploader.is_configured() {
            tracing::warn!(
                missing = %config.assets.missing_credentials().join(", "),
                "Asset host credentials incomplete; /upload-image is disabled"
            );
        }

        tracing::info!(
            upstream = %state.actions.endpoint(),
            resolve_media = state.resolve_media,
            media_concurrency = config.media.concurrency,
            static_root = %config.static_files.root,
            "Components initialized"
        );

        let router = build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Run the server until Ctrl+C, SIGTERM, or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ProxyConfig, state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/tools.json", get(tools_json))
        .route("/generator.json", get(generator_json))
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/api/{action}", post(api_action))
        .route("/upload-image", post(upload_image))
        .route_layer(middleware::from_fn(track_metrics))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let router = if config.server.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}

/// Count and time every matched route.
async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;
    metrics::record_request(route, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(upstream: &MockServer) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.upstream.url = Some(format!("{}/exec", upstream.uri()));
        config.upstream.timeout_secs = 5;
        config.media.timeout_secs = 2;
        config
    }

    fn app(config: &ProxyConfig) -> Router {
        build_router(config, AppState::from_config(config).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("expected request to build")
    }

    async fn json_body(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        serde_json::from_slice(&body).expect("expected json body")
    }

    #[test]
    fn test_missing_upstream_is_rejected() {
        let config = ProxyConfig::default();
        assert!(matches!(
            AppState::from_config(&config),
            Err(ServerError::MissingUpstream)
        ));
    }

    #[tokio::test]
    async fn when_health_is_requested_then_returns_ok_text() {
        let upstream = MockServer::start().await;
        let response = app(&test_config(&upstream))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn when_route_does_not_exist_then_returns_404_text() {
        let upstream = MockServer::start().await;
        let response = app(&test_config(&upstream))
            .oneshot(
                Request::builder()
                    .uri("/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Not Found");
    }

    #[tokio::test]
    async fn when_known_route_gets_wrong_method_then_returns_404_text() {
        let upstream = MockServer::start().await;
        let router = app(&test_config(&upstream));

        for (verb, uri) in [
            ("GET", "/login"),
            ("GET", "/api/echo"),
            ("GET", "/upload-image"),
            ("POST", "/health"),
        ] {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .method(verb)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{verb} {uri}");
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"Not Found");
        }
    }

    #[tokio::test]
    async fn when_login_password_is_missing_then_returns_400_without_upstream_call() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let response = app(&test_config(&upstream))
            .oneshot(post_json("/login", r#"{"mobile":"0123456789"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"success": false, "error": "Mobile and password required"})
        );
    }

    #[tokio::test]
    async fn when_action_body_is_not_an_object_then_returns_400() {
        let upstream = MockServer::start().await;
        let response = app(&test_config(&upstream))
            .oneshot(post_json("/api/echo", "[1,2,3]"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn when_action_is_empty_then_returns_404() {
        let upstream = MockServer::start().await;
        let response = app(&test_config(&upstream))
            .oneshot(post_json("/api/", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn when_media_resolution_is_disabled_then_photo_urls_pass_through() {
        let upstream = MockServer::start().await;
        let photo = format!("{}/x.png", upstream.uri());
        Mock::given(method("POST"))
            .and(path("/exec"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"PhotoURL": photo}]
            })))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/x.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1, 2, 3], "image/png"))
            .expect(0)
            .mount(&upstream)
            .await;

        let mut config = test_config(&upstream);
        config.media.resolve_api_responses = false;

        let response = app(&config)
            .oneshot(post_json("/api/getItems", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"][0]["PhotoURL"], photo);
    }

    #[tokio::test]
    async fn when_upstream_reports_failure_then_media_is_not_resolved() {
        let upstream = MockServer::start().await;
        let photo = format!("{}/x.png", upstream.uri());
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "nope",
                "data": {"PhotoURL": photo}
            })))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1, 2, 3], "image/png"))
            .expect(0)
            .mount(&upstream)
            .await;

        let response = app(&test_config(&upstream))
            .oneshot(post_json("/api/getItems", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["PhotoURL"], photo);
    }

    #[tokio::test]
    async fn when_body_exceeds_limit_then_returns_413() {
        let upstream = MockServer::start().await;
        let mut config = test_config(&upstream);
        config.server.max_body_bytes = 16;

        let response = app(&config)
            .oneshot(post_json("/api/echo", r#"{"payload":"this is far too long"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
