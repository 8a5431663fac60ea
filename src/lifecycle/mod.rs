//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build components → Bind listener
//!
//! Shutdown:
//!     SIGTERM/SIGINT (signals.rs) or Shutdown::trigger (shutdown.rs)
//!     → stop accepting → drain in-flight requests → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
