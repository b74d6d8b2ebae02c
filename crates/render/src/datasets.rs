//! Dataset discovery
//!
//! Datasets are precomputed `*.h5ad` files under the data directory. The
//! directory is the catalog: there is no manifest to parse and no caching of
//! its contents.

use crate::{RenderError, Result};
use std::path::{Path, PathBuf};

/// Dataset file extension.
const DATASET_EXT: &str = "h5ad";

/// List dataset names (file stems) under `data_dir`, sorted by name.
///
/// A missing data directory yields a dataset-not-found error: the server
/// cannot render anything without it.
///
/// # Errors
///
/// Returns [`RenderError::DatasetNotFound`] when the directory is absent and
/// [`RenderError::Io`] when it cannot be read.
pub fn list_datasets(data_dir: &Path) -> Result<Vec<String>> {
    if !data_dir.is_dir() {
        return Err(RenderError::dataset_not_found(
            data_dir.display().to_string(),
        ));
    }
    let mut names = Vec::new();
    let entries =
        std::fs::read_dir(data_dir).map_err(|e| RenderError::io(e, data_dir, "read_dir"))?;
    for entry in entries {
        let entry = entry.map_err(|e| RenderError::io(e, data_dir, "read_dir_entry"))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == DATASET_EXT)
            && let Some(stem) = path.file_stem()
        {
            names.push(stem.to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Resolve the on-disk path of a named dataset.
#[must_use]
pub fn dataset_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.{DATASET_EXT}"))
}

/// Pick the dataset to render from: the configured override when present,
/// otherwise the first dataset on disk.
///
/// # Errors
///
/// Returns [`RenderError::DatasetNotFound`] when the override names a file
/// that does not exist, or when no datasets are present at all.
pub fn pick_default_dataset(data_dir: &Path, configured: Option<&str>) -> Result<String> {
    if let Some(name) = configured {
        if dataset_path(data_dir, name).is_file() {
            return Ok(name.to_string());
        }
        return Err(RenderError::dataset_not_found(name));
    }

    list_datasets(data_dir)?
        .into_iter()
        .next()
        .ok_or_else(|| RenderError::dataset_not_found(format!("no datasets in {}", data_dir.display())))
}
