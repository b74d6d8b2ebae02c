//! Error types for the core crate

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for core operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during core operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(figserve::core::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "create")
        operation: String,
    },

    /// Configuration or environment error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(figserve::core::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Rejected user input (empty key, unsupported DPI, ...)
    #[error("Bad input: {message}")]
    #[diagnostic(
        code(figserve::core::bad_input),
        help("The request can be retried with corrected input")
    )]
    BadInput {
        /// Error message describing what was rejected
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create a bad-input error
    #[must_use]
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::BadInput {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
