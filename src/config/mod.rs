//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, then environment overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to each component constructor at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults so only the upstream URL is mandatory
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AssetHostConfig, ListenerConfig, MediaConfig, ObservabilityConfig, ProxyConfig,
    ServerConfig, StaticFilesConfig, UpstreamConfig,
};
pub use validation::ValidationError;
