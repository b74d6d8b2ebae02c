//! Figure directory layout
//!
//! All cached artifacts live under a single figure root:
//!
//! ```text
//! figures/
//!   png/      rasterized plots         (quota)
//!   pdf/      vector exports           (quota)
//!   tiff/     rasterized exports       (quota)
//!   locks/    ephemeral lock files     (never counted)
//! ```
//!
//! The three artifact directories count toward the cache quota; the lock
//! directory never does. Lock files found at startup are stale remnants of
//! crashed processes and are left for operational cleanup.

use crate::artifact::ArtifactKind;
use crate::key::PlotKey;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the global prune lock file inside the lock directory.
pub const PRUNE_LOCK_NAME: &str = "_prune.lock";

/// The on-disk layout of the figure cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureLayout {
    root: PathBuf,
}

impl FigureLayout {
    /// Create a layout rooted at `root`. No directories are created; call
    /// [`FigureLayout::ensure_dirs`] for that.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The figure root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding rasterized plots.
    #[must_use]
    pub fn png_dir(&self) -> PathBuf {
        self.root.join("png")
    }

    /// Directory holding vector exports.
    #[must_use]
    pub fn pdf_dir(&self) -> PathBuf {
        self.root.join("pdf")
    }

    /// Directory holding rasterized exports.
    #[must_use]
    pub fn tiff_dir(&self) -> PathBuf {
        self.root.join("tiff")
    }

    /// Directory holding per-artifact and global lock files.
    #[must_use]
    pub fn lock_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    /// The directories counted toward the cache quota (locks excluded).
    #[must_use]
    pub fn quota_dirs(&self) -> Vec<PathBuf> {
        vec![self.png_dir(), self.pdf_dir(), self.tiff_dir()]
    }

    /// Deterministic output path for an artifact.
    #[must_use]
    pub fn artifact_path(&self, kind: ArtifactKind, key: &PlotKey) -> PathBuf {
        self.root.join(kind.dir_name()).join(kind.file_name(key))
    }

    /// Deterministic lock path for an artifact.
    #[must_use]
    pub fn artifact_lock_path(&self, kind: ArtifactKind, key: &PlotKey) -> PathBuf {
        self.lock_dir().join(kind.lock_name(key))
    }

    /// Path of the global prune lock.
    #[must_use]
    pub fn prune_lock_path(&self) -> PathBuf {
        self.lock_dir().join(PRUNE_LOCK_NAME)
    }

    /// Create every directory of the layout.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when a directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.png_dir(),
            self.pdf_dir(),
            self.tiff_dir(),
            self.lock_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| Error::io(e, &dir, "create_dir_all"))?;
        }
        Ok(())
    }
}
