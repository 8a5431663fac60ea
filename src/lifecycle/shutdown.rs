//! Programmatic shutdown.
//!
//! OS signals are handled in `signals.rs`. This handle covers the other
//! way to stop the proxy: an embedding caller (the integration test
//! harness, or a supervisor running the server in-process) holds a
//! `Shutdown`, passes `subscribe()` to `HttpServer::run`, and calls
//! `trigger` to drain in-flight requests and return.

use tokio::sync::broadcast;

/// Cloneable stop handle for one or more running `HttpServer`s.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed server to stop. Returns how many were told;
    /// zero means the servers already exited or never started.
    pub fn trigger(&self) -> usize {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::debug!(notified, "Shutdown triggered");
        notified
    }

    /// Servers still waiting on this handle.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
