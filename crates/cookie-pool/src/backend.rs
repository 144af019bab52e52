//! Backend capability seam
//!
//! The pool only needs two operations from the Gemini side: establish a
//! session for a cookie pair, and generate text through an established
//! session. Both are dyn-compatible traits with `Pin<Box<dyn Future>>`
//! methods so the pool can hold `Arc<dyn SessionBackend>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Errors from backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The handshake for one cookie failed. Recorded as a health event, not
    /// surfaced to callers unless it exhausts the pool.
    #[error("session init failed: {0}")]
    Init(String),

    /// Generation failed after a session was already obtained. Surfaced
    /// as-is; never retried against another cookie.
    #[error("upstream generation failed: {0}")]
    Upstream(String),
}

/// A materialized, reusable session for one cookie.
pub trait BackendSession: Send + Sync {
    /// Generate content for a prompt. `model` is the advertised model alias.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        model: &'a str,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, BackendError>> + Send + 'a>>;
}

/// Factory for backend sessions.
pub trait SessionBackend: Send + Sync {
    /// Establish a session from a cookie pair. Expensive; the pool caches
    /// the result per cookie.
    fn connect<'a>(
        &'a self,
        psid: &'a str,
        psidts: Option<&'a str>,
    ) -> Pin<
        Box<
            dyn Future<Output = std::result::Result<Arc<dyn BackendSession>, BackendError>>
                + Send
                + 'a,
        >,
    >;
}
