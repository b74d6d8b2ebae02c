//! Filesystem-backed artifact cache for figserve
//!
//! This crate is the cache/concurrency core:
//! - [`lock`]: mutual exclusion built on atomic create-if-absent lock files,
//!   correct across OS processes, not just threads
//! - [`inventory`]: byte totals and file listings reconstructed from
//!   directory scans (the filesystem is the only source of truth)
//! - [`prune`]: size-bounded, oldest-first eviction serialized by a global
//!   non-blocking lock
//! - [`artifact`]: the per-request orchestration: double-checked existence,
//!   per-artifact locking, prune-before-render, guaranteed lock release
//!
//! # Concurrency model
//!
//! Multiple processes may share the same figure directories. No in-memory
//! registry coordinates them; correctness rests entirely on the
//! filesystem's atomic `create_new` guarantee. A crashed lock holder leaves
//! its lock file behind indefinitely; cleanup is an operator task.

mod error;

pub mod artifact;
pub mod inventory;
pub mod lock;
pub mod prune;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use artifact::{ArtifactCache, Ensured, RenderSource};
pub use inventory::{list_files, total_bytes, FileEntry};
pub use lock::LockGuard;
pub use prune::{prune_if_needed, PrunePolicy, PruneResult};
