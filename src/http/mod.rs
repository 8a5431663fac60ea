//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, trace span)
//!     → handlers.rs / static_files.rs (route-specific work)
//!     → response.rs (envelope, error → status mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{ApiError, Envelope};
pub use server::{build_router, AppState, HttpServer, ServerError};
