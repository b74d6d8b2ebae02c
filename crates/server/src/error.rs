//! HTTP error mapping
//!
//! One envelope shape for every failure:
//! `{ "ok": false, "error": { "code", "message", "detail" } }`.
//! Status classes mirror the cache taxonomy: validation failures are 400,
//! a missing dataset is 404, lock contention past the window is 408, and
//! anything else is a 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use figserve_cache::Error as CacheError;
use figserve_core::Error as CoreError;
use figserve_render::RenderError;
use serde_json::json;

/// A request-scoped failure, ready to render as the JSON envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    /// 401 with the standard envelope.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message: "missing or invalid bearer token".into(),
            detail: None,
        }
    }

    /// 400 for malformed request bodies.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_INPUT",
            message: message.into(),
            detail: None,
        }
    }

    /// 500 for failures outside the request taxonomy.
    #[must_use]
    pub fn internal(message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL",
            message: message.into(),
            detail,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let (status, code) = match &err {
            CoreError::BadInput { .. } => (StatusCode::BAD_REQUEST, "BAD_INPUT"),
            CoreError::Configuration { .. } | CoreError::Io { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        };
        Self {
            status,
            code,
            message: err.to_string(),
            detail: None,
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        let (status, code, detail) = match &err {
            RenderError::BadInput { .. } => (StatusCode::BAD_REQUEST, "BAD_INPUT", None),
            RenderError::LayerNotFound { detail } => (
                StatusCode::BAD_REQUEST,
                "LAYER_NOT_FOUND",
                Some(detail.clone()),
            ),
            RenderError::KeyNotFound { detail } => (
                StatusCode::BAD_REQUEST,
                "KEY_NOT_FOUND",
                Some(detail.clone()),
            ),
            RenderError::DatasetNotFound { name } => (
                StatusCode::NOT_FOUND,
                "DATASET_NOT_FOUND",
                Some(name.clone()),
            ),
            RenderError::Failed { stderr, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RENDER_FAILED",
                Some(stderr.clone()),
            ),
            RenderError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None),
        };
        Self {
            status,
            code,
            message: err.to_string(),
            detail,
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::LockTimeout { path } => Self {
                status: StatusCode::REQUEST_TIMEOUT,
                code: "LOCK_TIMEOUT",
                message: "another request is producing this artifact and is taking unusually long"
                    .into(),
                detail: Some(path.display().to_string()),
            },
            CacheError::Core(e) => e.into(),
            CacheError::Render(e) => e.into(),
            CacheError::Io { .. } => Self::internal(err.to_string(), None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(
            code = self.code,
            status = self.status.as_u16(),
            message = %self.message,
            "request failed"
        );
        let body = json!({
            "ok": false,
            "error": {
                "code": self.code,
                "message": self.message,
                "detail": self.detail,
            }
        });
        (self.status, Json(body)).into_response()
    }
}
