//! Error types for the render crate

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for render operations
#[derive(Error, Debug, Diagnostic)]
pub enum RenderError {
    /// Rejected render input
    #[error("Bad render input: {message}")]
    #[diagnostic(code(figserve::render::bad_input))]
    BadInput {
        /// What was rejected
        message: String,
    },

    /// The requested dataset file does not exist
    #[error("Dataset not found: {name}")]
    #[diagnostic(
        code(figserve::render::dataset_not_found),
        help("Check the data directory and the dataset name")
    )]
    DatasetNotFound {
        /// Dataset name or path that was requested
        name: String,
    },

    /// The requested expression layer is absent from the dataset
    #[error("Layer not found: {detail}")]
    #[diagnostic(code(figserve::render::layer_not_found))]
    LayerNotFound {
        /// Renderer-provided detail (layer name, available layers)
        detail: String,
    },

    /// The requested key is absent from the dataset
    #[error("Key not found in dataset: {detail}")]
    #[diagnostic(code(figserve::render::key_not_found))]
    KeyNotFound {
        /// Renderer-provided detail
        detail: String,
    },

    /// The external renderer exited unsuccessfully for an unclassified reason
    #[error("Renderer failed{}", status.map_or(String::new(), |s| format!(" with exit code {s}")))]
    #[diagnostic(
        code(figserve::render::failed),
        help("The stderr tail of the renderer is attached as detail")
    )]
    Failed {
        /// Exit code, when the process was not killed by a signal
        status: Option<i32>,
        /// Bounded tail of the renderer's stderr
        stderr: String,
    },

    /// I/O error while preparing or invoking the renderer
    #[error("I/O {operation} failed: {}", path.display())]
    #[diagnostic(code(figserve::render::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path involved in the failure
        path: Box<Path>,
        /// Operation that failed
        operation: String,
    },
}

impl RenderError {
    /// Create a bad-input error
    #[must_use]
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::BadInput {
            message: msg.into(),
        }
    }

    /// Create a dataset-not-found error
    #[must_use]
    pub fn dataset_not_found(name: impl Into<String>) -> Self {
        Self::DatasetNotFound { name: name.into() }
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

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;
