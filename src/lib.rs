//! Action proxy library.
//!
//! Forwards browser requests to a single action-based upstream endpoint,
//! inlines `PhotoURL` images in the responses, and stores uploaded images
//! on a source-hosting contents API.

pub mod assets;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod media;
pub mod observability;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
