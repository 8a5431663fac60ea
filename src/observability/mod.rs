//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and components produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (compact or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace span of every request
//! - Metrics endpoint is off unless enabled in config

pub mod logging;
pub mod metrics;
