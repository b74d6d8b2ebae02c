//! Error types for the cache crate

use figserve_render::RenderError;
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Could not acquire a lock within the configured window
    #[error("Lock acquisition timed out: {}", path.display())]
    #[diagnostic(
        code(figserve::cache::lock_timeout),
        help("Another process is likely producing the same artifact; retry later")
    )]
    LockTimeout {
        /// The lock file that stayed held
        path: Box<Path>,
    },

    /// I/O error during cache operations
    #[error("I/O {operation} failed: {}", path.display())]
    #[diagnostic(code(figserve::cache::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error
        path: Box<Path>,
        /// Operation that failed
        operation: String,
    },

    /// Invalid request input, propagated from core validation
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] figserve_core::Error),

    /// Failure of the external render capability
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),
}

impl Error {
    /// Create a lock-timeout error
    #[must_use]
    pub fn lock_timeout(path: impl AsRef<Path>) -> Self {
        Self::LockTimeout {
            path: path.as_ref().into(),
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
            path: path.as_ref().into(),
            operation: operation.into(),
        }
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
