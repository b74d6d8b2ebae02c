//! figserve server binary
//!
//! Resolves settings from the environment (with a few CLI overrides),
//! wires the command renderer into the artifact cache, and serves the HTTP
//! surface until SIGINT/SIGTERM.

use clap::Parser;
use figserve_cache::{ArtifactCache, PrunePolicy};
use figserve_core::Settings;
use figserve_render::CommandRenderer;
use figserve_server::{build_router, AppState};
use miette::{IntoDiagnostic, WrapErr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// On-demand scientific plot server with a size-bounded disk cache
#[derive(Debug, Parser)]
#[command(name = "figserve", version, about)]
struct Cli {
    /// Socket address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Root of the figure cache
    #[arg(long)]
    figure_dir: Option<PathBuf>,

    /// Directory holding precomputed datasets
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Emit JSON logs
    #[arg(long, env = "FIGSERVE_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "could not register SIGTERM handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "could not register SIGINT handler");
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut settings = Settings::from_env()?;
    if let Some(bind) = cli.bind {
        settings.bind = bind;
    }
    if let Some(dir) = cli.figure_dir {
        settings.figure_dir = dir;
    }
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    settings.ensure_dirs()?;

    let renderer = Arc::new(CommandRenderer::new(settings.renderer_cmd.clone()));
    let cache = Arc::new(ArtifactCache::new(
        settings.layout(),
        PrunePolicy {
            max_bytes: settings.cache_max_bytes,
            keep_newest: settings.keep_newest,
        },
        settings.lock_timeout,
        settings.lock_poll,
        renderer,
    ));

    let bind = settings.bind.clone();
    let state = AppState::new(Arc::new(settings), cache);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("could not bind {bind}"))?;
    tracing::info!(bind = %bind, "figserve listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .into_diagnostic()
        .wrap_err("server failed")
}
