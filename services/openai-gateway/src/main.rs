//! Gemini gateway
//!
//! Single-binary service that:
//! 1. Loads browser-session cookies from the environment into a
//!    health-tracked pool
//! 2. Exposes an OpenAI-compatible chat-completion API
//! 3. Fails over across cookies when session handshakes fail

mod backend_impl;
mod config;
mod dispatch;
mod metrics;
mod openai;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cookie_pool::{CookiePool, CookieSources, Policy};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend_impl::GeminiBackend;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::routes::{AppState, build_router};

/// How long in-flight requests get to drain after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting gemini-gateway");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let policy = Policy::from_tag(&config.pool.policy);
    info!(
        listen_addr = %config.server.listen_addr,
        policy = policy.label(),
        session_init_timeout_secs = config.pool.session_init_timeout_secs,
        stream_delay_ms = config.stream.delay_ms,
        "configuration loaded"
    );

    let specs = CookieSources::from_env()
        .into_specs()
        .context("no usable cookies in the environment")?;
    let pool = Arc::new(CookiePool::new(
        specs,
        Arc::new(GeminiBackend::new()),
        Duration::from_secs(config.pool.session_init_timeout_secs),
    )?);
    for cookie in &pool.status().cookies {
        info!(cookie = %cookie.name, "cookie registered");
    }

    let dispatcher = Arc::new(Dispatcher::new(
        pool.clone(),
        policy,
        Duration::from_millis(config.stream.delay_ms),
    ));

    let state = AppState {
        dispatcher,
        pool,
        policy,
        prometheus: prometheus_handle,
    };
    let app = build_router(state, config.server.max_connections);

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "accepting requests");

    // Graceful shutdown: stop accepting on SIGTERM/SIGINT, then drain
    // in-flight requests for at most DRAIN_TIMEOUT. The timer starts when
    // the signal fires, not when the server starts.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
