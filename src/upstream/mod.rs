//! Upstream action endpoint integration.
//!
//! # Data Flow
//! ```text
//! handler (action name + caller fields)
//!     → types.rs (merge into {action, ...payload})
//!     → client.rs (POST, read text, parse JSON, classify)
//!     → Result<Value, UpstreamError>
//! ```

pub mod client;
pub mod types;

pub use client::ActionClient;
pub use types::{UpstreamError, UpstreamResult};
