//! Pool backend adapter over the Gemini web client
//!
//! Bridges the pool's `SessionBackend` seam to the concrete `gemini-web`
//! client. The newtype around `GeminiClient` exists because both the trait
//! and the client live in other crates.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cookie_pool::{BackendError, BackendSession, SessionBackend};
use gemini_web::{GeminiClient, Model};

/// The production backend: sessions are real Gemini web sessions.
#[derive(Default)]
pub struct GeminiBackend;

impl GeminiBackend {
    pub fn new() -> Self {
        Self
    }
}

struct GeminiSession {
    client: GeminiClient,
}

impl BackendSession for GeminiSession {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        model: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, BackendError>> + Send + 'a>> {
        Box::pin(async move {
            let model = Model::from_alias(model)
                .ok_or_else(|| BackendError::Upstream(format!("unknown model alias: {model}")))?;
            self.client
                .generate(prompt, model)
                .await
                .map_err(|e| BackendError::Upstream(e.to_string()))
        })
    }
}

impl SessionBackend for GeminiBackend {
    fn connect<'a>(
        &'a self,
        psid: &'a str,
        psidts: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn BackendSession>, BackendError>> + Send + 'a>>
    {
        Box::pin(async move {
            let client = GeminiClient::connect(psid, psidts)
                .await
                .map_err(|e| BackendError::Init(e.to_string()))?;
            Ok(Arc::new(GeminiSession { client }) as Arc<dyn BackendSession>)
        })
    }
}
