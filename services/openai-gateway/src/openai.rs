//! OpenAI-compatible wire types
//!
//! The subset of the chat-completion API the gateway speaks. Field layout
//! matches what OpenAI SDK clients serialize and expect back; sampling knobs
//! are accepted so off-the-shelf clients work, but the web frontend offers no
//! equivalent, so they are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    #[allow(dead_code)]
    pub temperature: Option<f64>,
    #[serde(default)]
    #[allow(dead_code)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    #[allow(dead_code)]
    pub top_p: Option<f64>,
    #[serde(default)]
    #[allow(dead_code)]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    #[allow(dead_code)]
    pub presence_penalty: Option<f64>,
    #[serde(default)]
    #[allow(dead_code)]
    pub stop: Option<StopSequence>,
}

/// `stop` accepts a single string or a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
pub enum StopSequence {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Serialize)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    pub fn new(
        id: &str,
        created: u64,
        model: &str,
        content: Option<String>,
        finish_reason: Option<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            object: "chat.completion.chunk",
            created,
            model: model.to_string(),
            choices: vec![StreamChoice {
                index: 0,
                delta: Delta { content },
                finish_reason,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub owned_by: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub object: &'static str,
    pub data: Vec<ModelInfo>,
}

impl ModelsResponse {
    /// Advertise every model alias the backend serves.
    pub fn current(created: u64) -> Self {
        Self {
            object: "list",
            data: gemini_web::Model::ALL
                .iter()
                .map(|model| ModelInfo {
                    id: model.alias().to_string(),
                    object: "model",
                    created,
                    owned_by: "google",
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_stream_to_false() {
        let request: ChatCompletionRequest = serde_json::from_str(
            r#"{"model":"gemini-2.5-flash","messages":[{"role":"user","content":"Hi"}]}"#,
        )
        .unwrap();
        assert!(!request.stream);
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn request_accepts_sampling_knobs() {
        let request: ChatCompletionRequest = serde_json::from_str(
            r#"{
                "model": "gemini-2.5-flash",
                "messages": [{"role":"user","content":"Hi"}],
                "temperature": 0.7,
                "max_tokens": 256,
                "top_p": 0.9,
                "frequency_penalty": 0.0,
                "presence_penalty": 0.0,
                "stop": ["\n\n"]
            }"#,
        )
        .unwrap();
        assert_eq!(request.model, "gemini-2.5-flash");
    }

    #[test]
    fn stop_accepts_string_or_list() {
        let one: ChatCompletionRequest = serde_json::from_str(
            r#"{"model":"m","messages":[],"stop":"END"}"#,
        )
        .unwrap();
        assert!(matches!(one.stop, Some(StopSequence::One(_))));

        let many: ChatCompletionRequest = serde_json::from_str(
            r#"{"model":"m","messages":[],"stop":["END","STOP"]}"#,
        )
        .unwrap();
        assert!(matches!(many.stop, Some(StopSequence::Many(ref v)) if v.len() == 2));
    }

    #[test]
    fn content_chunk_serializes_delta_and_null_finish() {
        let chunk = ChatCompletionChunk::new(
            "chatcmpl-abc",
            1700000000,
            "gemini-2.5-flash",
            Some("word ".into()),
            None,
        );
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["object"], "chat.completion.chunk");
        assert_eq!(json["choices"][0]["delta"]["content"], "word ");
        assert!(json["choices"][0]["finish_reason"].is_null());
    }

    #[test]
    fn finish_chunk_has_empty_delta() {
        let chunk = ChatCompletionChunk::new(
            "chatcmpl-abc",
            1700000000,
            "gemini-2.5-flash",
            None,
            Some("stop".into()),
        );
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["choices"][0]["delta"], serde_json::json!({}));
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
    }

    #[test]
    fn models_response_lists_all_aliases_owned_by_google() {
        let response = ModelsResponse::current(1700000000);
        assert_eq!(response.object, "list");
        assert_eq!(response.data.len(), 6);
        assert!(response.data.iter().all(|m| m.owned_by == "google"));
        assert!(response.data.iter().any(|m| m.id == "gemini-2.5-flash"));
    }
}
