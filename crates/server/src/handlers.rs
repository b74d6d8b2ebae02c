//! Route handlers
//!
//! Every plot/export route resolves the render source (dataset, layer,
//! basis) from settings, then delegates to the artifact cache; the handlers
//! themselves contain no cache logic.

use crate::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use figserve_cache::{Ensured, RenderSource};
use figserve_core::ArtifactKind;
use figserve_render::{dataset_path, list_datasets, pick_default_dataset};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct PlotForm {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ExportFormat {
    Pdf,
    Tiff,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportForm {
    key: String,
    format: ExportFormat,
    dpi: Option<u32>,
}

/// Resolve the render inputs shared by every artifact request.
fn render_source(state: &AppState) -> Result<RenderSource, ApiError> {
    let settings = &state.settings;
    let name = pick_default_dataset(&settings.data_dir, settings.default_dataset.as_deref())?;
    Ok(RenderSource {
        dataset: dataset_path(&settings.data_dir, &name),
        layer: settings.default_layer.clone(),
        basis: settings.default_basis.clone(),
        plot_dpi: settings.plot_dpi,
    })
}

/// Read an ensured artifact back for the response body.
async fn artifact_bytes(ensured: &Ensured) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(&ensured.path).await.map_err(|e| {
        ApiError::internal(
            "cached artifact could not be read back",
            Some(format!("{}: {e}", ensured.path.display())),
        )
    })
}

fn cache_hit_header(ensured: &Ensured) -> (&'static str, &'static str) {
    ("x-cache-hit", if ensured.cache_hit { "1" } else { "0" })
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    let layout = state.settings.layout();
    Json(json!({
        "ok": true,
        "settings": &*state.settings,
        "png_dir": layout.png_dir(),
        "pdf_dir": layout.pdf_dir(),
        "tiff_dir": layout.tiff_dir(),
        "lock_dir": layout.lock_dir(),
    }))
    .into_response()
}

pub(crate) async fn datasets_handler(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let datasets = list_datasets(&state.settings.data_dir)?;
    Ok(Json(json!({ "ok": true, "datasets": datasets })).into_response())
}

pub(crate) async fn plot_handler(
    State(state): State<AppState>,
    Json(form): Json<PlotForm>,
) -> Result<Response, ApiError> {
    let source = render_source(&state)?;
    let ensured = state
        .cache
        .ensure(ArtifactKind::Plot, &form.key, &source)
        .await?;
    tracing::info!(key = %ensured.key, cache_hit = ensured.cache_hit, "plot ensured");
    Ok(Json(json!({
        "ok": true,
        "key": ensured.key,
        "path": ensured.path,
        "cache_hit": ensured.cache_hit,
    }))
    .into_response())
}

pub(crate) async fn plot_png_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let source = render_source(&state)?;
    let ensured = state
        .cache
        .ensure(ArtifactKind::Plot, &key, &source)
        .await?;
    let bytes = artifact_bytes(&ensured).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE.as_str(), "image/png"),
            cache_hit_header(&ensured),
        ],
        bytes,
    )
        .into_response())
}

pub(crate) async fn export_handler(
    State(state): State<AppState>,
    Json(form): Json<ExportForm>,
) -> Result<Response, ApiError> {
    let (kind, content_type) = match form.format {
        ExportFormat::Pdf => (ArtifactKind::ExportPdf, "application/pdf"),
        ExportFormat::Tiff => {
            let dpi = form
                .dpi
                .ok_or_else(|| ApiError::bad_request("tiff export requires a dpi"))?;
            (
                ArtifactKind::export_tiff(dpi, &state.settings.allowed_export_dpi)?,
                "image/tiff",
            )
        }
    };

    let source = render_source(&state)?;
    let ensured = state.cache.ensure(kind, &form.key, &source).await?;
    tracing::info!(
        key = %ensured.key,
        format = kind.format(),
        cache_hit = ensured.cache_hit,
        "export ensured"
    );

    let file_name = kind.file_name(&ensured.key);
    let bytes = artifact_bytes(&ensured).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE.as_str(), content_type.to_string()),
            (
                header::CONTENT_DISPOSITION.as_str(),
                format!("attachment; filename=\"{file_name}\""),
            ),
            (
                "x-cache-hit",
                if ensured.cache_hit { "1" } else { "0" }.to_string(),
            ),
        ],
        bytes,
    )
        .into_response())
}
