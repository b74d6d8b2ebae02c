//! Per-artifact cache orchestration
//!
//! The `ensure` flow per request:
//!
//! ```text
//! validate -> CHECK -> (HIT)
//!                   -> (MISS) -> LOCK -> RECHECK -> (HIT)
//!                                                -> PRUNE -> RENDER
//! ```
//!
//! The fast-path existence check takes no lock. On a miss the request takes
//! a lock keyed by the artifact identity (kind + key + DPI), so renders of
//! different artifacts run fully in parallel; only identical requests
//! serialize. The post-lock re-check closes the window where two requests
//! both observed a miss: the one that loses the lock race finds the winner's
//! artifact and returns a hit without rendering.
//!
//! Pruning runs before the render, never after: pruning after writing
//! could delete the artifact that was just produced.

use crate::prune::{prune_if_needed, PrunePolicy};
use crate::{lock, Result};
use figserve_core::{ArtifactKind, FigureLayout, PlotKey};
use figserve_render::{RenderRequest, Renderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Inputs the renderer needs beyond the artifact identity.
#[derive(Debug, Clone)]
pub struct RenderSource {
    /// Path of the dataset file to draw from
    pub dataset: PathBuf,
    /// Expression layer to color by
    pub layer: String,
    /// Spatial coordinate key
    pub basis: String,
    /// DPI used for inline PNG plots
    pub plot_dpi: u32,
}

/// Result of an [`ArtifactCache::ensure`] call.
#[derive(Debug, Clone)]
pub struct Ensured {
    /// The sanitized key the artifact is stored under
    pub key: PlotKey,
    /// The deterministic artifact path
    pub path: PathBuf,
    /// True when the artifact already existed and no render ran
    pub cache_hit: bool,
}

/// The per-artifact orchestration layer over locking, pruning and the
/// external render capability.
pub struct ArtifactCache {
    layout: FigureLayout,
    policy: PrunePolicy,
    lock_timeout: Duration,
    lock_poll: Duration,
    renderer: Arc<dyn Renderer>,
}

impl ArtifactCache {
    /// Create a cache over `layout` backed by `renderer`.
    #[must_use]
    pub fn new(
        layout: FigureLayout,
        policy: PrunePolicy,
        lock_timeout: Duration,
        lock_poll: Duration,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            layout,
            policy,
            lock_timeout,
            lock_poll,
            renderer,
        }
    }

    /// The layout this cache serves from.
    #[must_use]
    pub fn layout(&self) -> &FigureLayout {
        &self.layout
    }

    /// Return the artifact for `(kind, raw_key)`, rendering it on a miss.
    ///
    /// # Errors
    ///
    /// - [`figserve_core::Error::BadInput`] when the key sanitizes to empty
    ///   (before any lock or I/O)
    /// - [`crate::Error::LockTimeout`] when another context holds the
    ///   per-artifact lock past the configured window
    /// - any [`figserve_render::RenderError`] from the render capability
    pub async fn ensure(
        &self,
        kind: ArtifactKind,
        raw_key: &str,
        source: &RenderSource,
    ) -> Result<Ensured> {
        let key = PlotKey::new(raw_key)?;
        let path = self.layout.artifact_path(kind, &key);

        // Fast path: read-only, safe to race.
        if path.exists() {
            tracing::debug!(key = %key, path = %path.display(), "cache hit");
            return Ok(Ensured {
                key,
                path,
                cache_hit: true,
            });
        }

        let lock_path = self.layout.artifact_lock_path(kind, &key);
        let _guard = lock::acquire(&lock_path, self.lock_timeout, self.lock_poll).await?;

        // Re-check under the lock: a concurrent request may have finished
        // the render while we were waiting.
        if path.exists() {
            tracing::debug!(key = %key, path = %path.display(), "cache hit after lock");
            return Ok(Ensured {
                key,
                path,
                cache_hit: true,
            });
        }

        // Prune before writing so the fresh artifact is never a candidate.
        match prune_if_needed(&self.policy, &self.layout) {
            Ok(result) if result.skipped_due_to_lock => {
                tracing::debug!(key = %key, "prune skipped under contention");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "prune failed; continuing with render");
            }
        }

        let request = RenderRequest {
            dataset: source.dataset.clone(),
            key: key.clone(),
            layer: source.layer.clone(),
            basis: source.basis.clone(),
            format: kind.format(),
            dpi: match kind {
                ArtifactKind::Plot => Some(source.plot_dpi),
                _ => kind.dpi(),
            },
            out_path: path.clone(),
        };
        self.renderer.render(&request).await?;

        tracing::info!(key = %key, path = %path.display(), "rendered artifact");
        Ok(Ensured {
            key,
            path,
            cache_hit: false,
        })
    }
}
