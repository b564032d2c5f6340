//! Error types and result aliases for tydi operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the tydi crates with actionable error messages.

use thiserror::Error;

/// Unified error type for all tydi operations
#[derive(Error, Debug)]
pub enum TydiError {
    // Resolution errors
    #[error("Circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    #[error("Missing dependency \"{name}\", unable to compile dependency tree")]
    MissingDependency { name: String },

    // Compile errors
    #[error("Entry file \"{path}\" for \"{name}\" does not exist")]
    EntryNotFound { name: String, path: String },

    #[error("Unable to resolve entry \".d.ts\" file for \"{name}\"")]
    EntryResolution { name: String },

    #[error("Unable to read typings for \"{name}\"")]
    TypingsReadFailure {
        name: String,
        #[source]
        source: Box<TydiError>,
    },

    #[error("Unable to resolve module \"{specifier}\" in \"{file}\"")]
    UnresolvedSpecifier { specifier: String, file: String },

    // Transport errors
    #[error("File \"{path}\" does not exist")]
    NotFound { path: String },

    #[error("Request to {url} returned status {code}")]
    HttpStatus { url: String, code: u16 },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse { path: String, message: String },

    // Config errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for tydi operations
pub type TydiResult<T> = Result<T, TydiError>;

impl TydiError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Wrap an entry-read failure with the namespaced dependency name
    pub fn typings_read_failure(name: String, source: TydiError) -> Self {
        Self::TypingsReadFailure {
            name,
            source: Box::new(source),
        }
    }

    /// Check whether this error marks an unreadable optional manifest.
    ///
    /// These are converted to `missing: true` nodes during resolution
    /// instead of aborting the walk.
    pub fn is_local_recoverable(&self) -> bool {
        matches!(
            self,
            TydiError::NotFound { .. } | TydiError::Io { .. } | TydiError::HttpStatus { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            TydiError::CircularDependency { .. } => {
                Some("Remove circular dependencies by restructuring your typings")
            },
            TydiError::MissingDependency { .. } => {
                Some("Install the dependency or check the name in your manifest")
            },
            TydiError::EntryResolution { .. } | TydiError::EntryNotFound { .. } => {
                Some("Point \"typings\" or \"main\" at a \".d.ts\" file in the manifest")
            },
            TydiError::Network { .. } => Some("Check your internet connection and try again"),
            _ => None,
        }
    }
}
