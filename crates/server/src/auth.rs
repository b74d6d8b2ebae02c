//! Bearer-token authentication
//!
//! Users live in a JSON file (`{ "users": [{ "username", "token" }] }`)
//! that is re-read on every request: the file is ground truth, exactly
//! like the cache directories, so operator edits take effect immediately
//! without a restart.

use crate::{ApiError, AppState};
use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct AuthFile {
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    username: String,
    token: String,
}

/// Middleware gate for every route except `/health`.
pub(crate) async fn require_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented: Option<String> = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    match presented {
        Some(token) => match verify_token(&state.settings.auth_file, &token) {
            Ok(Some(username)) => {
                tracing::debug!(user = %username, "authenticated request");
                next.run(request).await
            }
            Ok(None) => ApiError::unauthorized().into_response(),
            Err(err) => err.into_response(),
        },
        None => ApiError::unauthorized().into_response(),
    }
}

/// Check `token` against the users file; returns the matching username.
fn verify_token(auth_file: &Path, token: &str) -> Result<Option<String>, ApiError> {
    let raw = std::fs::read_to_string(auth_file).map_err(|e| {
        ApiError::internal(
            "users file is missing or unreadable",
            Some(format!("{}: {e}", auth_file.display())),
        )
    })?;
    let parsed: AuthFile = serde_json::from_str(&raw).map_err(|e| {
        ApiError::internal("users file is not valid JSON", Some(e.to_string()))
    })?;

    Ok(parsed
        .users
        .into_iter()
        .find(|u| !u.username.trim().is_empty() && u.token == token)
        .map(|u| u.username))
}
