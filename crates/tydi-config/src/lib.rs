//! Manifest parsing for tydi.
//!
//! This crate handles parsing and shallow validation of the three manifest
//! shapes (`typings.json`, `package.json`, `bower.json`) plus `.bowerrc`,
//! and converts each into a partial tree node for the resolver. A missing
//! manifest is not an error here; ecosystems are optional and absence is
//! handled by the resolver's `missing` marking.

pub mod bower;
pub mod discover;
pub mod fields;
pub mod npm;
pub mod typings;

// Re-export main types
pub use bower::{BowerJson, BowerRc};
pub use fields::{BrowserValue, StringOrList};
pub use npm::PackageJson;
pub use typings::TypingsJson;

use tydi_core::error::TydiError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, TydiError>;

/// Parse a JSON manifest, attaching the source location to parse errors
pub fn parse_manifest<'a, T: serde::Deserialize<'a>>(
    content: &'a str,
    location: &str,
) -> ConfigResult<T> {
    serde_json::from_str(content).map_err(|e| TydiError::JsonParse {
        path: location.to_string(),
        message: e.to_string(),
    })
}
