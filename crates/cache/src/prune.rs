//! Size-bounded cache pruning
//!
//! When the quota directories exceed the configured ceiling, files are
//! deleted oldest-first (by mtime, unconditionally; no access-frequency or
//! size weighting) until the total falls back under the ceiling. Concurrent
//! prune attempts are serialized by a single non-blocking global lock:
//! whoever loses the race skips pruning entirely rather than queueing up.
//!
//! Pruning is advisory and best-effort. Deletion failures are tolerated,
//! and a `keep_newest` floor can block enough candidates that the cache
//! stays over budget after the call. Callers must not assume
//! `after_bytes <= max_bytes`.

use crate::inventory::{list_files, total_bytes};
use crate::{lock, Result};
use figserve_core::FigureLayout;
use std::io;
use std::time::{Duration, Instant};

/// Eviction policy for [`prune_if_needed`].
#[derive(Debug, Clone, Copy)]
pub struct PrunePolicy {
    /// Maximum total bytes across the quota directories.
    pub max_bytes: u64,
    /// Protect the newest N files from deletion, even if the budget stays
    /// exceeded. A floor, not a guarantee.
    pub keep_newest: usize,
}

/// Outcome of one prune attempt. Observability only, never control flow.
#[derive(Debug, Clone, Copy)]
pub struct PruneResult {
    /// Total bytes before the attempt
    pub before_bytes: u64,
    /// Total bytes after the attempt (freshly recomputed)
    pub after_bytes: u64,
    /// Files actually deleted
    pub deleted_files: usize,
    /// Bytes reclaimed by those deletions
    pub deleted_bytes: u64,
    /// Wall time spent in the attempt
    pub elapsed: Duration,
    /// True when another context held the global prune lock and this
    /// attempt deleted nothing
    pub skipped_due_to_lock: bool,
}

impl PruneResult {
    fn untouched(before: u64, after: u64, elapsed: Duration, skipped: bool) -> Self {
        Self {
            before_bytes: before,
            after_bytes: after,
            deleted_files: 0,
            deleted_bytes: 0,
            elapsed,
            skipped_due_to_lock: skipped,
        }
    }
}

/// Delete oldest files until the quota directories fit under the policy
/// ceiling.
///
/// The common case, already under budget, returns after a single
/// directory scan without touching the lock. On contention the attempt is
/// skipped outright; pruning never blocks a request.
///
/// # Errors
///
/// Only unexpected I/O on the global lock file itself propagates; every
/// other failure mode (vanished files, undeletable files) is absorbed as
/// part of best-effort eviction.
pub fn prune_if_needed(policy: &PrunePolicy, layout: &FigureLayout) -> Result<PruneResult> {
    let started = Instant::now();
    let dirs = layout.quota_dirs();

    let before = total_bytes(&dirs);
    if before <= policy.max_bytes {
        return Ok(PruneResult::untouched(before, before, started.elapsed(), false));
    }

    // Single non-blocking attempt: someone else pruning is as good as us
    // pruning.
    let Some(_guard) = lock::try_acquire(&layout.prune_lock_path())? else {
        let after = total_bytes(&dirs);
        tracing::debug!(
            before_bytes = before,
            after_bytes = after,
            "prune skipped; global prune lock is held"
        );
        return Ok(PruneResult::untouched(before, after, started.elapsed(), true));
    };

    // Re-check under the lock: the previous holder may have already brought
    // the total under budget.
    let mut current = total_bytes(&dirs);
    if current <= policy.max_bytes {
        return Ok(PruneResult::untouched(before, current, started.elapsed(), false));
    }

    let mut entries = list_files(&dirs);
    entries.sort_by_key(|e| e.modified);

    let deletable = if policy.keep_newest > 0 && entries.len() > policy.keep_newest {
        &entries[..entries.len() - policy.keep_newest]
    } else {
        &entries[..]
    };

    let mut deleted_files = 0usize;
    let mut deleted_bytes = 0u64;
    for entry in deletable {
        if current <= policy.max_bytes {
            break;
        }
        match std::fs::remove_file(&entry.path) {
            Ok(()) => {
                deleted_files += 1;
                deleted_bytes += entry.size;
                current = current.saturating_sub(entry.size);
                tracing::debug!(
                    path = %entry.path.display(),
                    size = entry.size,
                    "pruned cached artifact"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Vanished concurrently; its bytes are gone either way.
                current = current.saturating_sub(entry.size);
            }
            Err(e) => {
                tracing::warn!(
                    path = %entry.path.display(),
                    error = %e,
                    "could not prune file; skipping"
                );
            }
        }
    }

    let after = total_bytes(&dirs);
    tracing::info!(
        before_bytes = before,
        after_bytes = after,
        deleted_files,
        deleted_bytes,
        "cache pruned"
    );
    Ok(PruneResult {
        before_bytes: before,
        after_bytes: after,
        deleted_files,
        deleted_bytes,
        elapsed: started.elapsed(),
        skipped_due_to_lock: false,
    })
}
