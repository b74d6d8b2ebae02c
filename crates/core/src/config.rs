//! Runtime configuration resolved from the environment
//!
//! Every setting has a `FIGSERVE_`-prefixed environment variable and a
//! default. Malformed numeric values are configuration errors rather than
//! silent fallbacks, so a typo in a deployment manifest fails loudly at
//! startup instead of quietly running with a default quota.

use crate::paths::FigureLayout;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default cache ceiling: 10 GiB.
const DEFAULT_CACHE_MAX_GB: u64 = 10;

/// Default lock acquisition timeout.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(600);

/// Default lock poll interval.
const DEFAULT_LOCK_POLL: Duration = Duration::from_millis(200);

fn env_str(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_str(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            Error::configuration(format!("environment variable {name} has invalid value {raw:?}"))
        }),
    }
}

/// Resolved figserve settings.
///
/// Serializable so the health endpoint can expose the effective
/// configuration; nothing here is secret.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Directory holding precomputed dataset files (`*.h5ad`).
    pub data_dir: PathBuf,
    /// Root of the figure cache (png/pdf/tiff/locks subdirectories).
    pub figure_dir: PathBuf,
    /// Maximum total bytes across the quota directories.
    pub cache_max_bytes: u64,
    /// Number of newest files protected from pruning.
    pub keep_newest: usize,
    /// Per-artifact lock acquisition timeout.
    pub lock_timeout: Duration,
    /// Sleep between lock acquisition attempts.
    pub lock_poll: Duration,
    /// DPI for inline PNG plots.
    pub plot_dpi: u32,
    /// DPI values accepted for TIFF exports.
    pub allowed_export_dpi: BTreeSet<u32>,
    /// Expression layer passed to the renderer by default.
    pub default_layer: String,
    /// Spatial coordinate key passed to the renderer by default.
    pub default_basis: String,
    /// Dataset to render from when the request names none; `None` means
    /// "first dataset found on disk, sorted by name".
    pub default_dataset: Option<String>,
    /// External plotting command invoked for cache misses.
    pub renderer_cmd: String,
    /// JSON users file checked for bearer tokens.
    pub auth_file: PathBuf,
    /// Socket address the HTTP server binds to.
    pub bind: String,
}

impl Settings {
    /// Resolve settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when a numeric variable fails to
    /// parse.
    pub fn from_env() -> Result<Self> {
        let figure_dir = env_str("FIGSERVE_FIGURE_DIR").map_or_else(
            || {
                // Platform cache dir, then a relative fallback for dev runs.
                dirs::cache_dir().map_or_else(
                    || PathBuf::from("figures"),
                    |base| base.join("figserve/figures"),
                )
            },
            PathBuf::from,
        );

        let allowed_export_dpi = match env_str("FIGSERVE_EXPORT_DPI") {
            None => [150, 300, 600, 1200].into_iter().collect(),
            Some(raw) => {
                let mut set = BTreeSet::new();
                for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let dpi = part.parse::<u32>().map_err(|_| {
                        Error::configuration(format!(
                            "FIGSERVE_EXPORT_DPI has invalid entry {part:?}"
                        ))
                    })?;
                    set.insert(dpi);
                }
                if set.is_empty() {
                    return Err(Error::configuration(
                        "FIGSERVE_EXPORT_DPI must list at least one DPI value",
                    ));
                }
                set
            }
        };

        Ok(Self {
            data_dir: env_str("FIGSERVE_DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from),
            figure_dir,
            cache_max_bytes: env_parse::<u64>("FIGSERVE_CACHE_MAX_GB")?
                .unwrap_or(DEFAULT_CACHE_MAX_GB)
                * 1024
                * 1024
                * 1024,
            keep_newest: env_parse::<usize>("FIGSERVE_KEEP_NEWEST")?.unwrap_or(0),
            lock_timeout: env_parse::<u64>("FIGSERVE_LOCK_TIMEOUT_SECS")?
                .map_or(DEFAULT_LOCK_TIMEOUT, Duration::from_secs),
            lock_poll: env_parse::<u64>("FIGSERVE_LOCK_POLL_MS")?
                .map_or(DEFAULT_LOCK_POLL, Duration::from_millis),
            plot_dpi: env_parse::<u32>("FIGSERVE_PLOT_DPI")?.unwrap_or(300),
            allowed_export_dpi,
            default_layer: env_str("FIGSERVE_DEFAULT_LAYER").unwrap_or_else(|| "lognorm".into()),
            default_basis: env_str("FIGSERVE_DEFAULT_BASIS").unwrap_or_else(|| "spatial".into()),
            default_dataset: env_str("FIGSERVE_DEFAULT_DATASET"),
            renderer_cmd: env_str("FIGSERVE_RENDERER_CMD")
                .unwrap_or_else(|| "figserve-render".into()),
            auth_file: env_str("FIGSERVE_AUTH_FILE")
                .map_or_else(|| PathBuf::from("auth.json"), PathBuf::from),
            bind: env_str("FIGSERVE_BIND").unwrap_or_else(|| "127.0.0.1:8080".into()),
        })
    }

    /// The figure layout derived from [`Settings::figure_dir`].
    #[must_use]
    pub fn layout(&self) -> FigureLayout {
        FigureLayout::new(&self.figure_dir)
    }

    /// Create the data directory and the whole figure layout.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when a directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| Error::io(e, &self.data_dir, "create_dir_all"))?;
        self.layout().ensure_dirs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_without_env() {
        temp_env::with_vars_unset(
            [
                "FIGSERVE_FIGURE_DIR",
                "FIGSERVE_CACHE_MAX_GB",
                "FIGSERVE_EXPORT_DPI",
                "FIGSERVE_LOCK_TIMEOUT_SECS",
            ],
            || {
                let settings = Settings::from_env().expect("defaults should resolve");
                assert_eq!(settings.cache_max_bytes, 10 * 1024 * 1024 * 1024);
                assert_eq!(settings.keep_newest, 0);
                assert_eq!(settings.lock_timeout, Duration::from_secs(600));
                assert_eq!(settings.lock_poll, Duration::from_millis(200));
                assert_eq!(
                    settings.allowed_export_dpi,
                    [150, 300, 600, 1200].into_iter().collect()
                );
            },
        );
    }

    #[test]
    fn env_overrides_win() {
        temp_env::with_vars(
            [
                ("FIGSERVE_FIGURE_DIR", Some("/srv/figs")),
                ("FIGSERVE_CACHE_MAX_GB", Some("2")),
                ("FIGSERVE_EXPORT_DPI", Some("72, 150")),
                ("FIGSERVE_KEEP_NEWEST", Some("5")),
            ],
            || {
                let settings = Settings::from_env().expect("overrides should resolve");
                assert_eq!(settings.figure_dir, PathBuf::from("/srv/figs"));
                assert_eq!(settings.cache_max_bytes, 2 * 1024 * 1024 * 1024);
                assert_eq!(settings.keep_newest, 5);
                assert_eq!(
                    settings.allowed_export_dpi,
                    [72, 150].into_iter().collect()
                );
            },
        );
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        temp_env::with_var("FIGSERVE_CACHE_MAX_GB", Some("ten"), || {
            let err = Settings::from_env().unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }));
        });
    }
}
