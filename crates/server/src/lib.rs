//! HTTP surface for figserve
//!
//! A thin axum layer over the cache core: every route except `/health`
//! requires a bearer token from the users file, and every plot/export route
//! funnels through [`figserve_cache::ArtifactCache::ensure`]. Errors map to
//! the same status classes the cache taxonomy defines (bad input 400,
//! missing dataset 404, lock timeout 408, everything else 500) with a JSON
//! envelope `{ ok, error: { code, message, detail } }`.

mod auth;
mod error;
mod handlers;
mod middleware;

pub use error::ApiError;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use figserve_cache::ArtifactCache;
use figserve_core::Settings;
use std::sync::Arc;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    /// Effective configuration (exposed on `/health`)
    pub settings: Arc<Settings>,
    /// The artifact cache all plot/export routes go through
    pub cache: Arc<ArtifactCache>,
}

impl AppState {
    /// Assemble state from resolved settings and a ready cache.
    #[must_use]
    pub fn new(settings: Arc<Settings>, cache: Arc<ArtifactCache>) -> Self {
        Self { settings, cache }
    }
}

/// Build the figserve router. `/health` stays unauthenticated; everything
/// else sits behind the bearer-token check.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/datasets", get(handlers::datasets_handler))
        .route("/plot", post(handlers::plot_handler))
        .route("/img/png/:key", get(handlers::plot_png_handler))
        .route("/export", post(handlers::export_handler))
        .layer(from_fn_with_state(state.clone(), auth::require_auth))
        .route("/health", get(handlers::health_handler))
        .layer(from_fn(middleware::request_tracing_middleware))
        .with_state(state)
}
