//! Renderer seam for figserve
//!
//! Plot drawing is an external capability: figserve hands a fully resolved
//! [`RenderRequest`] to a [`Renderer`] and expects a file at the requested
//! output path, or a typed failure. The cache core never looks inside
//! datasets and never alters rendering logic.
//!
//! Two implementations live here:
//! - [`CommandRenderer`] shells out to a configured plotting command (the
//!   production path; scientific plotting stacks live outside this process).
//! - Test doubles in the cache crate's tests implement the trait directly.

mod command;
mod datasets;
mod error;

pub use command::CommandRenderer;
pub use datasets::{dataset_path, list_datasets, pick_default_dataset};
pub use error::{RenderError, Result};

use async_trait::async_trait;
use figserve_core::PlotKey;
use std::path::PathBuf;

/// Everything a renderer needs to produce one artifact.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Path to the dataset file the plot is drawn from.
    pub dataset: PathBuf,
    /// Sanitized identifier of the feature to plot.
    pub key: PlotKey,
    /// Expression layer to color by.
    pub layer: String,
    /// Spatial coordinate key.
    pub basis: String,
    /// Output format name (`png`, `pdf`, `tiff`).
    pub format: &'static str,
    /// Rasterization DPI; `None` for vector output.
    pub dpi: Option<u32>,
    /// Where the artifact must be written.
    pub out_path: PathBuf,
}

/// An opaque "render a scientific image to a path" capability.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Produce the artifact described by `request` at `request.out_path`.
    ///
    /// # Errors
    ///
    /// Returns a typed [`RenderError`]; on failure no artifact is considered
    /// produced (a partially written file may remain on disk).
    async fn render(&self, request: &RenderRequest) -> Result<()>;
}
