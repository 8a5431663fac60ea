//! Media inlining for action responses.
//!
//! # Data Flow
//! ```text
//! successful action result
//!     → resolver.rs (collect PhotoURL slots, fetch, base64-encode)
//!     → same JSON tree with data URIs in place of image URLs
//! ```
//!
//! # Design Decisions
//! - Best effort: fetch failures are logged, never propagated
//! - No caching; every request fetches its own images
//! - Fan-out bounded by `media.concurrency` (1 = sequential)

pub mod resolver;

pub use resolver::{data_uri, MediaResolver, PHOTO_KEY};
