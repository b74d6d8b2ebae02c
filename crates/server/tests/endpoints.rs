//! Endpoint tests against a real listener
//!
//! The server is bound to an ephemeral port and driven with raw HTTP/1.1
//! requests, so routing, auth middleware and error envelopes are exercised
//! exactly as a client would see them.

use async_trait::async_trait;
use figserve_cache::{ArtifactCache, PrunePolicy};
use figserve_core::Settings;
use figserve_render::{RenderError, RenderRequest, Renderer};
use figserve_server::{build_router, AppState};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Renderer double writing a fixed payload.
struct StubRenderer;

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, request: &RenderRequest) -> figserve_render::Result<()> {
        if let Some(parent) = request.out_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RenderError::io(e, parent, "create_dir_all"))?;
        }
        tokio::fs::write(&request.out_path, b"fake-image-bytes")
            .await
            .map_err(|e| RenderError::io(e, &request.out_path, "write"))?;
        Ok(())
    }
}

fn test_settings(tmp: &TempDir) -> Settings {
    let data_dir = tmp.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("sham.h5ad"), b"").unwrap();

    let auth_file = tmp.path().join("auth.json");
    std::fs::write(
        &auth_file,
        r#"{ "users": [{ "username": "ada", "token": "s3cret" }] }"#,
    )
    .unwrap();

    Settings {
        data_dir,
        figure_dir: tmp.path().join("figures"),
        cache_max_bytes: u64::MAX,
        keep_newest: 0,
        lock_timeout: Duration::from_secs(5),
        lock_poll: Duration::from_millis(10),
        plot_dpi: 300,
        allowed_export_dpi: BTreeSet::from([150, 300, 600, 1200]),
        default_layer: "lognorm".into(),
        default_basis: "spatial".into(),
        default_dataset: None,
        renderer_cmd: "unused".into(),
        auth_file,
        bind: "127.0.0.1:0".into(),
    }
}

async fn spawn_server(tmp: &TempDir) -> SocketAddr {
    let settings = test_settings(tmp);
    settings.ensure_dirs().unwrap();

    let cache = Arc::new(ArtifactCache::new(
        settings.layout(),
        PrunePolicy {
            max_bytes: settings.cache_max_bytes,
            keep_newest: settings.keep_newest,
        },
        settings.lock_timeout,
        settings.lock_poll,
        Arc::new(StubRenderer),
    ));
    let app = build_router(AppState::new(Arc::new(settings), cache));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server loop");
    });
    addr
}

async fn send_raw(addr: SocketAddr, request: &str) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

fn get(addr: SocketAddr, path: &str, token: Option<&str>) -> String {
    let auth = token.map_or(String::new(), |t| format!("Authorization: Bearer {t}\r\n"));
    format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\n{auth}Connection: close\r\n\r\n")
}

fn post_json(addr: SocketAddr, path: &str, token: &str, body: &str) -> String {
    format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nAuthorization: Bearer {token}\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn health_is_public_and_reports_layout() {
    let tmp = TempDir::new().unwrap();
    let addr = spawn_server(&tmp).await;

    let (status, _head, body) = send_raw(addr, &get(addr, "/health", None)).await;
    assert_eq!(status, 200);

    let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(payload["ok"], true);
    assert!(payload["png_dir"].as_str().unwrap().ends_with("png"));
}

#[tokio::test]
async fn routes_require_a_valid_token() {
    let tmp = TempDir::new().unwrap();
    let addr = spawn_server(&tmp).await;

    let (status, _head, body) = send_raw(addr, &get(addr, "/datasets", None)).await;
    assert_eq!(status, 401);
    let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(payload["error"]["code"], "UNAUTHORIZED");

    let (status, _head, _body) =
        send_raw(addr, &get(addr, "/datasets", Some("wrong-token"))).await;
    assert_eq!(status, 401);

    let (status, _head, body) = send_raw(addr, &get(addr, "/datasets", Some("s3cret"))).await;
    assert_eq!(status, 200);
    let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(payload["datasets"][0], "sham");
}

#[tokio::test]
async fn plot_misses_then_hits() {
    let tmp = TempDir::new().unwrap();
    let addr = spawn_server(&tmp).await;

    let (status, _head, body) = send_raw(
        addr,
        &post_json(addr, "/plot", "s3cret", r#"{"key":"Gfap"}"#),
    )
    .await;
    assert_eq!(status, 200);
    let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(payload["cache_hit"], false);
    assert_eq!(payload["key"], "Gfap");

    let (status, _head, body) = send_raw(
        addr,
        &post_json(addr, "/plot", "s3cret", r#"{"key":"Gfap"}"#),
    )
    .await;
    assert_eq!(status, 200);
    let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(payload["cache_hit"], true);
}

#[tokio::test]
async fn inline_png_sets_cache_hit_header() {
    let tmp = TempDir::new().unwrap();
    let addr = spawn_server(&tmp).await;

    let (status, head, body) =
        send_raw(addr, &get(addr, "/img/png/Gfap", Some("s3cret"))).await;
    assert_eq!(status, 200);
    let head = head.to_lowercase();
    assert!(head.contains("content-type: image/png"));
    assert!(head.contains("x-cache-hit: 0"));
    assert_eq!(body, "fake-image-bytes");

    let (status, head, _body) =
        send_raw(addr, &get(addr, "/img/png/Gfap", Some("s3cret"))).await;
    assert_eq!(status, 200);
    assert!(head.to_lowercase().contains("x-cache-hit: 1"));
}

#[tokio::test]
async fn export_validates_before_rendering() {
    let tmp = TempDir::new().unwrap();
    let addr = spawn_server(&tmp).await;

    // Unsupported DPI is rejected up front.
    let (status, _head, body) = send_raw(
        addr,
        &post_json(
            addr,
            "/export",
            "s3cret",
            r#"{"key":"Gfap","format":"tiff","dpi":72}"#,
        ),
    )
    .await;
    assert_eq!(status, 400);
    let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(payload["error"]["code"], "BAD_INPUT");

    // Missing DPI for tiff is rejected too.
    let (status, _head, _body) = send_raw(
        addr,
        &post_json(
            addr,
            "/export",
            "s3cret",
            r#"{"key":"Gfap","format":"tiff"}"#,
        ),
    )
    .await;
    assert_eq!(status, 400);

    // A valid request downloads the artifact.
    let (status, head, body) = send_raw(
        addr,
        &post_json(
            addr,
            "/export",
            "s3cret",
            r#"{"key":"Gfap","format":"tiff","dpi":600}"#,
        ),
    )
    .await;
    assert_eq!(status, 200);
    let head = head.to_lowercase();
    assert!(head.contains("content-type: image/tiff"));
    assert!(head.contains("attachment; filename=\"gfap_600.tiff\""));
    assert_eq!(body, "fake-image-bytes");
}

#[tokio::test]
async fn empty_key_is_rejected_before_any_render() {
    let tmp = TempDir::new().unwrap();
    let addr = spawn_server(&tmp).await;

    let (status, _head, body) = send_raw(
        addr,
        &post_json(addr, "/plot", "s3cret", r#"{"key":"   "}"#),
    )
    .await;
    assert_eq!(status, 400);
    let payload: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(payload["error"]["code"], "BAD_INPUT");
}
