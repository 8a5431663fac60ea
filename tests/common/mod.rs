//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use action_proxy::config::ProxyConfig;
use action_proxy::http::HttpServer;
use action_proxy::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A proxy running on an ephemeral port for the duration of a test.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestProxy {
    /// Bind, build and spawn the server. The listener is bound before this
    /// returns, so requests can be sent immediately.
    pub async fn start(config: ProxyConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = HttpServer::new(config).expect("server should build");
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .unwrap();

        Self {
            addr,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("proxy unreachable")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("proxy unreachable")
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing the action endpoint at `upstream` + `/exec`, with short
/// timeouts and media resolution on.
pub fn config_for(upstream: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.url = Some(format!("{}/exec", upstream));
    config.upstream.timeout_secs = 5;
    config.media.timeout_secs = 2;
    config.media.concurrency = 4;
    config
}

/// Start a raw HTTP backend that answers every request with whatever `f`
/// returns: status, optional content type, body bytes. Unlike a mock
/// server it sends no headers beyond the ones given.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Option<&'static str>, Vec<u8>)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                // Requests here are small GETs; one read drains the head.
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let (status, content_type, body) = f().await;
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    500 => "Internal Server Error",
                    503 => "Service Unavailable",
                    _ => "Unknown",
                };
                let mut head = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                    status,
                    reason,
                    body.len()
                );
                if let Some(content_type) = content_type {
                    head.push_str(&format!("Content-Type: {}\r\n", content_type));
                }
                head.push_str("\r\n");

                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
