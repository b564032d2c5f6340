//! Unified fetching for tydi.
//!
//! Every read of a manifest or declaration file goes through one
//! [`Fetcher`], whether the location is a filesystem path or an HTTP(S)
//! URL. HTTP responses pass through a durable content cache whose reads
//! are lock-free and whose writes are guarded by per-path lockfiles.

pub mod cache;
pub mod fetcher;
pub mod lock;

// Re-export main types
pub use cache::HttpCache;
pub use fetcher::{FetchConfig, Fetcher};
pub use lock::FileLock;

use tydi_core::error::TydiError;

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, TydiError>;
