//! HTTP surface: route wiring and handlers
//!
//! Pure plumbing between the OpenAI-compatible wire shapes and the
//! dispatcher/pool. Error bodies use the `{"detail": ...}` shape clients of
//! the original service already parse.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION};
use axum::response::{IntoResponse, Response, Sse};
use axum::routing::{get, post};
use cookie_pool::{CookiePool, Policy};
use futures_util::StreamExt;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;

use crate::dispatch::{self, Dispatcher};
use crate::metrics;
use crate::openai::{ChatCompletionRequest, ModelsResponse};

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub pool: Arc<CookiePool>,
    pub policy: Policy,
    pub prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
///
/// Applies a concurrency limit layer bounding concurrent requests, and a
/// permissive CORS layer so browser-based OpenAI clients can call the
/// gateway directly.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/v1/models", get(models_handler))
        .route("/v1/chat/completions", post(chat_completions_handler))
        .route("/health", get(health_handler))
        .route("/cookies/status", get(cookies_status_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Service descriptor with the endpoint map.
async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Gemini API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "models": "/v1/models",
            "chat_completions": "/v1/chat/completions",
            "health": "/health",
            "cookies_status": "/cookies/status",
        }
    }))
}

/// List available models.
async fn models_handler() -> Json<ModelsResponse> {
    Json(ModelsResponse::current(dispatch::unix_seconds()))
}

/// Create a chat completion, streaming or not.
async fn chat_completions_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatCompletionRequest>,
) -> Response {
    let started = Instant::now();

    let response = if request.stream {
        match state.dispatcher.stream_frames(&request).await {
            Ok(frames) => {
                let stream = dispatch::into_event_stream(frames).map(Ok::<_, Infallible>);
                (
                    [(CACHE_CONTROL, "no-cache"), (CONNECTION, "keep-alive")],
                    Sse::new(stream),
                )
                    .into_response()
            }
            Err(e) => error_response(e),
        }
    } else {
        match state.dispatcher.complete(&request).await {
            Ok(completion) => Json(completion).into_response(),
            Err(e) => error_response(e),
        }
    };

    metrics::record_request(
        response.status().as_u16(),
        "POST",
        started.elapsed().as_secs_f64(),
    );
    response
}

fn error_response(error: dispatch::Error) -> Response {
    if let Some(label) = error.metric_label() {
        metrics::record_upstream_error(label);
    }
    error.into_response()
}

/// Health check: can the pool currently hand out a session?
///
/// Always 200; the verdict lives in the body.
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.pool.acquire(state.policy).await {
        Ok(_) => Json(serde_json::json!({
            "status": "healthy",
            "gemini": "connected",
        })),
        Err(e) => Json(serde_json::json!({
            "status": "unhealthy",
            "error": e.to_string(),
        })),
    }
}

/// Pool snapshot: per-cookie health without secrets.
async fn cookies_status_handler(State(state): State<AppState>) -> Response {
    Json(state.pool.status()).into_response()
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
