//! Sanitized plot keys
//!
//! Artifact files are named after the identifier the user asked for (a gene
//! name, a feature id, ...). The raw input is untrusted, so it is reduced to
//! a filesystem-safe alphabet before it ever reaches a path: alphanumerics
//! plus `.`, `_` and `-` survive, everything else becomes `_`. The mapping
//! is deterministic and never produces an empty string or a path separator.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A sanitized, filesystem-safe plot identifier.
///
/// Constructed via [`PlotKey::new`]; the inner string is immutable after
/// sanitization, so a `PlotKey` can be embedded in file and lock names
/// without further escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlotKey(String);

impl PlotKey {
    /// Sanitize a raw, user-supplied identifier into a plot key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadInput`] when the trimmed input is empty.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::bad_input("plot key must not be empty"));
        }
        let safe = trimmed
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Ok(Self(safe))
    }

    /// The sanitized key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
