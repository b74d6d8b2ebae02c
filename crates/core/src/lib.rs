//! Core types for the figserve plot cache
//!
//! This crate provides the shared foundation for the figserve ecosystem:
//! - Sanitized plot keys that map deterministically to artifact paths
//! - Artifact kinds and their on-disk naming scheme
//! - The figure directory layout (artifact dirs, lock dir, quota set)
//! - Runtime configuration resolved from the environment
//!
//! # Overview
//!
//! Everything figserve knows about the cache is reconstructed from the
//! filesystem: there is no persistent index. The types here encode the
//! deterministic mapping from a user-supplied identifier to exactly one
//! artifact path per (kind, DPI) pair, which is what makes directory scans
//! a sufficient source of truth.

mod error;

pub mod artifact;
pub mod config;
pub mod key;
pub mod paths;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use artifact::ArtifactKind;
pub use config::Settings;
pub use key::PlotKey;
pub use paths::FigureLayout;
