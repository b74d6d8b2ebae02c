//! Artifact kinds and their on-disk naming
//!
//! Three kinds of artifacts are cached, one sibling directory each:
//!
//! | kind | directory | filename |
//! |------|-----------|----------|
//! | `Plot` | `png/` | `{key}.png` |
//! | `ExportPdf` | `pdf/` | `{key}.pdf` |
//! | `ExportTiff` | `tiff/` | `{key}_{dpi}.tiff` |
//!
//! Lock file names carry the same identity so that requests for different
//! artifacts never contend on a lock.

use crate::key::PlotKey;
use crate::{Error, Result};
use std::collections::BTreeSet;

/// A kind of cached artifact, together with its quality parameter where one
/// applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Rasterized plot at the server's configured DPI, served inline.
    Plot,
    /// Vector export, no DPI.
    ExportPdf,
    /// Rasterized export at a caller-chosen DPI from a fixed allow-set.
    ExportTiff {
        /// Dots per inch for the rasterization
        dpi: u32,
    },
}

impl ArtifactKind {
    /// Validate a TIFF export DPI against the configured allow-set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadInput`] when `dpi` is not in `allowed`. The check
    /// runs before any lock or filesystem activity.
    pub fn export_tiff(dpi: u32, allowed: &BTreeSet<u32>) -> Result<Self> {
        if allowed.contains(&dpi) {
            Ok(Self::ExportTiff { dpi })
        } else {
            Err(Error::bad_input(format!(
                "unsupported export dpi {dpi}; allowed: {allowed:?}"
            )))
        }
    }

    /// Name of the sibling directory this kind is cached under.
    #[must_use]
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Plot => "png",
            Self::ExportPdf => "pdf",
            Self::ExportTiff { .. } => "tiff",
        }
    }

    /// Output format name, as passed to the renderer.
    #[must_use]
    pub fn format(&self) -> &'static str {
        match self {
            Self::Plot => "png",
            Self::ExportPdf => "pdf",
            Self::ExportTiff { .. } => "tiff",
        }
    }

    /// The DPI the renderer should rasterize at, if this kind has one.
    #[must_use]
    pub fn dpi(&self) -> Option<u32> {
        match self {
            Self::Plot | Self::ExportPdf => None,
            Self::ExportTiff { dpi } => Some(*dpi),
        }
    }

    /// Deterministic artifact filename for `key`.
    #[must_use]
    pub fn file_name(&self, key: &PlotKey) -> String {
        match self {
            Self::Plot => format!("{key}.png"),
            Self::ExportPdf => format!("{key}.pdf"),
            Self::ExportTiff { dpi } => format!("{key}_{dpi}.tiff"),
        }
    }

    /// Deterministic lock filename for `key`.
    ///
    /// Distinct (kind, key, dpi) triples yield distinct lock names, so only
    /// identical-artifact requests ever serialize on each other.
    #[must_use]
    pub fn lock_name(&self, key: &PlotKey) -> String {
        match self {
            Self::Plot => format!("{key}.plot_png.lock"),
            Self::ExportPdf => format!("{key}.export_pdf.lock"),
            Self::ExportTiff { dpi } => format!("{key}.export_tiff_{dpi}.lock"),
        }
    }
}
