//! Request dispatch: chat request in, backend call out
//!
//! Translates one OpenAI-shaped chat request into one Gemini call: validates
//! the model, flattens the message list into a prompt, borrows a session from
//! the cookie pool, and maps the result into the response envelope: either a
//! single JSON body or a paced word-chunk SSE frame sequence.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response};
use cookie_pool::{CookiePool, Policy};
use futures_util::Stream;
use gemini_web::Model;
use tracing::debug;

use crate::openai::{
    ChatCompletionChoice, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse,
    ChatMessage, Usage,
};

/// Dispatch errors, mapped onto the HTTP contract.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Model '{model}' not found. Available models: {available}")]
    InvalidModel { model: String, available: String },

    #[error("Failed to get Gemini session: {0}")]
    Pool(#[from] cookie_pool::Error),

    #[error("{0}")]
    Upstream(String),
}

impl Error {
    pub(crate) fn invalid_model(model: &str) -> Self {
        let available = Model::ALL
            .iter()
            .map(|m| m.alias())
            .collect::<Vec<_>>()
            .join(", ");
        Error::InvalidModel {
            model: model.to_string(),
            available,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidModel { .. } => StatusCode::BAD_REQUEST,
            Error::Pool(_) | Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label for the upstream-error counter; `None` for client errors.
    pub fn metric_label(&self) -> Option<&'static str> {
        match self {
            Error::InvalidModel { .. } => None,
            Error::Pool(_) => Some("pool"),
            Error::Upstream(_) => Some("upstream"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

/// One SSE frame: the payload of a `data:` line plus the pacing delay to
/// apply before emitting it.
#[derive(Debug)]
pub struct Frame {
    pub delay: Duration,
    pub payload: String,
}

/// Translates inbound chat requests into backend calls.
pub struct Dispatcher {
    pool: Arc<CookiePool>,
    policy: Policy,
    stream_delay: Duration,
}

impl Dispatcher {
    pub fn new(pool: Arc<CookiePool>, policy: Policy, stream_delay: Duration) -> Self {
        Self {
            pool,
            policy,
            stream_delay,
        }
    }

    /// Non-streaming completion.
    ///
    /// A failure during generation (session already obtained) is surfaced
    /// directly; failover only happens inside the pool during session
    /// acquisition.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, Error> {
        let model = Model::from_alias(&request.model)
            .ok_or_else(|| Error::invalid_model(&request.model))?;
        let prompt = messages_to_prompt(&request.messages);
        debug!(model = model.alias(), prompt_words = word_count(&prompt), "dispatching completion");

        let session = self.pool.acquire(self.policy).await?;
        let text = session
            .generate(&prompt, model.alias())
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        Ok(ChatCompletionResponse {
            id: request_id(),
            object: "chat.completion",
            created: unix_seconds(),
            model: request.model.clone(),
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatMessage {
                    role: "assistant".into(),
                    content: text.clone(),
                },
                finish_reason: "stop".into(),
            }],
            usage: Usage {
                prompt_tokens: word_count(&prompt),
                completion_tokens: word_count(&text),
                total_tokens: word_count(&prompt) + word_count(&text),
            },
        })
    }

    /// Streaming completion: resolve the backend call, then frame the result.
    ///
    /// Only an unknown model fails up front (400 before any pool access).
    /// Pool and backend failures after that are delivered in-band as a single
    /// error frame, so a streaming client always sees a well-formed,
    /// `[DONE]`-terminated stream.
    pub async fn stream_frames(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<VecDeque<Frame>, Error> {
        let model = Model::from_alias(&request.model)
            .ok_or_else(|| Error::invalid_model(&request.model))?;
        let prompt = messages_to_prompt(&request.messages);
        debug!(model = model.alias(), prompt_words = word_count(&prompt), "dispatching stream");

        let outcome = match self.pool.acquire(self.policy).await {
            Ok(session) => session
                .generate(&prompt, model.alias())
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        Ok(frame_payloads(
            &outcome,
            &request_id(),
            unix_seconds(),
            &request.model,
            self.stream_delay,
        ))
    }
}

/// Flatten an ordered message list into a single prompt.
///
/// Each recognized role renders as `"<RoleLabel>: <content>"`, entries joined
/// with a blank line. Messages with any other role, including `tool` and
/// `function`, are silently dropped from the prompt. That drop is inherited
/// wire behavior, kept for compatibility with the service this replaces.
pub fn messages_to_prompt(messages: &[ChatMessage]) -> String {
    let mut parts = Vec::new();
    for message in messages {
        let label = match message.role.as_str() {
            "system" => "System",
            "user" => "User",
            "assistant" => "Assistant",
            _ => continue,
        };
        parts.push(format!("{label}: {}", message.content));
    }
    parts.join("\n\n")
}

/// Whitespace-delimited word count, the synthetic token estimate. Not a
/// real tokenizer.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Build the full frame sequence for a resolved generation outcome.
///
/// Success: one chunk per word (trailing space except on the last word),
/// paced by `delay`, then a `stop` finish chunk, then the `[DONE]` sentinel.
/// Failure: exactly one error chunk (finish reason `error`), then `[DONE]`.
pub(crate) fn frame_payloads(
    outcome: &Result<String, String>,
    id: &str,
    created: u64,
    model: &str,
    delay: Duration,
) -> VecDeque<Frame> {
    let mut frames = VecDeque::new();

    match outcome {
        Ok(text) => {
            let words: Vec<&str> = text.split_whitespace().collect();
            for (i, word) in words.iter().enumerate() {
                let content = if i < words.len() - 1 {
                    format!("{word} ")
                } else {
                    (*word).to_string()
                };
                let chunk = ChatCompletionChunk::new(id, created, model, Some(content), None);
                frames.push_back(Frame {
                    delay: if i == 0 { Duration::ZERO } else { delay },
                    payload: chunk_json(&chunk),
                });
            }
            let finish = ChatCompletionChunk::new(id, created, model, None, Some("stop".into()));
            frames.push_back(Frame {
                delay: if frames.is_empty() { Duration::ZERO } else { delay },
                payload: chunk_json(&finish),
            });
        }
        Err(message) => {
            let chunk = ChatCompletionChunk::new(
                id,
                created,
                model,
                Some(format!("Error: {message}")),
                Some("error".into()),
            );
            frames.push_back(Frame {
                delay: Duration::ZERO,
                payload: chunk_json(&chunk),
            });
        }
    }

    frames.push_back(Frame {
        delay: Duration::ZERO,
        payload: "[DONE]".into(),
    });
    frames
}

fn chunk_json(chunk: &ChatCompletionChunk) -> String {
    serde_json::to_string(chunk).expect("chunk serialization is infallible")
}

/// Turn a frame sequence into a paced SSE event stream. Lazy, finite, and
/// not restartable.
pub(crate) fn into_event_stream(frames: VecDeque<Frame>) -> impl Stream<Item = Event> + Send {
    futures_util::stream::unfold(frames, |mut frames| async move {
        let frame = frames.pop_front()?;
        if !frame.delay.is_zero() {
            tokio::time::sleep(frame.delay).await;
        }
        Some((Event::default().data(frame.payload), frames))
    })
}

pub(crate) fn request_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4().simple())
}

pub(crate) fn unix_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn message(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.into(),
            content: content.into(),
        }
    }

    #[test]
    fn prompt_renders_roles_in_order_with_blank_lines() {
        let prompt = messages_to_prompt(&[
            message("system", "Be brief."),
            message("user", "Hi"),
            message("assistant", "Hello!"),
            message("user", "Bye"),
        ]);
        assert_eq!(
            prompt,
            "System: Be brief.\n\nUser: Hi\n\nAssistant: Hello!\n\nUser: Bye"
        );
    }

    #[test]
    fn prompt_drops_unrecognized_roles() {
        let prompt = messages_to_prompt(&[
            message("user", "Hi"),
            message("tool", "tool output that vanishes"),
            message("function", "also vanishes"),
            message("user", "Bye"),
        ]);
        assert_eq!(prompt, "User: Hi\n\nUser: Bye");
    }

    #[test]
    fn prompt_of_empty_list_is_empty() {
        assert_eq!(messages_to_prompt(&[]), "");
    }

    #[test]
    fn word_count_splits_on_whitespace() {
        assert_eq!(word_count("User: Hi"), 2);
        assert_eq!(word_count("  one\ttwo\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn three_word_response_yields_four_chunks_before_done() {
        let outcome = Ok("one two three".to_string());
        let frames = frame_payloads(
            &outcome,
            "chatcmpl-test",
            1700000000,
            "gemini-2.5-flash",
            Duration::from_millis(50),
        );

        assert_eq!(frames.len(), 5, "3 words + stop + [DONE]");
        let payloads: Vec<&str> = frames.iter().map(|f| f.payload.as_str()).collect();

        let first: serde_json::Value = serde_json::from_str(payloads[0]).unwrap();
        assert_eq!(first["choices"][0]["delta"]["content"], "one ");
        let second: serde_json::Value = serde_json::from_str(payloads[1]).unwrap();
        assert_eq!(second["choices"][0]["delta"]["content"], "two ");
        let third: serde_json::Value = serde_json::from_str(payloads[2]).unwrap();
        assert_eq!(
            third["choices"][0]["delta"]["content"], "three",
            "last word carries no trailing space"
        );
        let finish: serde_json::Value = serde_json::from_str(payloads[3]).unwrap();
        assert_eq!(finish["choices"][0]["finish_reason"], "stop");
        assert_eq!(finish["choices"][0]["delta"], serde_json::json!({}));
        assert_eq!(payloads[4], "[DONE]");
    }

    #[test]
    fn pacing_delay_applies_to_every_chunk_after_the_first() {
        let outcome = Ok("one two three".to_string());
        let delay = Duration::from_millis(50);
        let frames = frame_payloads(&outcome, "id", 0, "m", delay);

        let delays: Vec<Duration> = frames.iter().map(|f| f.delay).collect();
        assert_eq!(
            delays,
            [Duration::ZERO, delay, delay, delay, Duration::ZERO],
            "first word and [DONE] are immediate; the rest are paced"
        );
    }

    #[test]
    fn failed_outcome_is_one_error_chunk_then_done() {
        let outcome = Err("pool exhausted: all cookies failed".to_string());
        let frames = frame_payloads(&outcome, "id", 0, "gemini-2.5-flash", Duration::from_millis(50));

        assert_eq!(frames.len(), 2);
        let chunk: serde_json::Value = serde_json::from_str(&frames[0].payload).unwrap();
        assert_eq!(
            chunk["choices"][0]["delta"]["content"],
            "Error: pool exhausted: all cookies failed"
        );
        assert_eq!(chunk["choices"][0]["finish_reason"], "error");
        assert_eq!(frames[1].payload, "[DONE]");
    }

    #[test]
    fn empty_response_yields_stop_and_done_only() {
        let outcome = Ok(String::new());
        let frames = frame_payloads(&outcome, "id", 0, "m", Duration::from_millis(50));
        assert_eq!(frames.len(), 2);
        let finish: serde_json::Value = serde_json::from_str(&frames[0].payload).unwrap();
        assert_eq!(finish["choices"][0]["finish_reason"], "stop");
        assert_eq!(frames[1].payload, "[DONE]");
    }

    #[tokio::test(start_paused = true)]
    async fn event_stream_emits_all_frames_in_order() {
        let outcome = Ok("alpha beta".to_string());
        let frames = frame_payloads(&outcome, "id", 0, "m", Duration::from_millis(50));
        let events: Vec<Event> = into_event_stream(frames).collect().await;
        assert_eq!(events.len(), 4, "2 words + stop + [DONE]");
    }

    #[test]
    fn invalid_model_error_lists_available_models() {
        let err = Error::invalid_model("gpt-4");
        let text = err.to_string();
        assert!(text.contains("'gpt-4' not found"), "got: {text}");
        assert!(text.contains("gemini-2.5-flash"), "got: {text}");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.metric_label().is_none());
    }

    #[test]
    fn pool_and_upstream_errors_map_to_500() {
        let pool_err = Error::Pool(cookie_pool::Error::PoolExhausted("all dead".into()));
        assert_eq!(pool_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(pool_err.metric_label(), Some("pool"));

        let upstream = Error::Upstream("backend said no".into());
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.metric_label(), Some("upstream"));
    }

    #[test]
    fn request_ids_are_unique_and_prefixed() {
        let a = request_id();
        let b = request_id();
        assert!(a.starts_with("chatcmpl-"));
        assert_ne!(a, b);
    }
}
