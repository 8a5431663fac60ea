//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by route, status
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_upstream_calls_total` (counter): action calls by outcome
//! - `proxy_media_fetches_total` (counter): image fetches by outcome
//! - `proxy_uploads_total` (counter): asset uploads by outcome
//!
//! Recording is a no-op until a recorder is installed, so handlers and
//! tests can call these unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(%addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(%addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled inbound request.
pub fn record_request(route: String, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one upstream action call.
///
/// Action names come from the request path, so they stay out of the labels
/// and only appear on the `upstream_action` span.
pub fn record_upstream_call(outcome: &'static str) {
    metrics::counter!("proxy_upstream_calls_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of one `PhotoURL` fetch.
pub fn record_media_fetch(outcome: &'static str) {
    metrics::counter!("proxy_media_fetches_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of one asset upload.
pub fn record_upload(outcome: &'static str) {
    metrics::counter!("proxy_uploads_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_upstream_calls_are_labelled_by_outcome_only() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            for _ in 0..3 {
                record_upstream_call("success");
            }
            record_upstream_call("transport");
        });

        let rendered = handle.render();
        let series: Vec<&str> = rendered
            .lines()
            .filter(|line| line.starts_with("proxy_upstream_calls_total"))
            .collect();
        assert_eq!(series.len(), 2, "{rendered}");
        assert!(series.contains(&"proxy_upstream_calls_total{outcome=\"success\"} 3"));
        assert!(series.contains(&"proxy_upstream_calls_total{outcome=\"transport\"} 1"));
        assert!(!rendered.contains("action="));
    }
}
