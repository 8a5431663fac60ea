//! Asset host integration.
//!
//! # Data Flow
//! ```text
//! /upload-image body (base64 or data URI, file name)
//!     → uploader.rs (credential check, validation, naming)
//!     → PUT {api_base}/repos/{owner}/{repo}/contents/{dir}/{millis}_{name}
//!     → download URL or UploadError
//! ```
//!
//! # Security Constraints
//! - The token only comes from configuration and is never logged

pub mod types;
pub mod uploader;

pub use types::{UploadError, UploadedAsset};
pub use uploader::AssetUploader;
