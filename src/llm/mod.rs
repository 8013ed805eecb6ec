//! Chat-completion model access: request types, the [`ChatModel`] seam, and
//! the prompts the pipeline sends.

pub mod openai;
pub mod prompt;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
    pub detail: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("No API key configured for the model endpoint")]
    MissingApiKey,

    #[error("Model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model response contained no message content")]
    EmptyResponse,
}

/// A chat-completion backend. One call per request, no retries.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `request` and return the first choice's text verbatim.
    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_and_image_messages_serialize_to_chat_format() {
        let request = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![
                ChatMessage::user_text("describe"),
                ChatMessage::user_parts(vec![ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "data:image/png;base64,AAAA".into(),
                        detail: "high",
                    },
                }]),
            ],
            temperature: None,
            max_tokens: Some(1000),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [
                    { "role": "user", "content": "describe" },
                    {
                        "role": "user",
                        "content": [{
                            "type": "image_url",
                            "image_url": { "url": "data:image/png;base64,AAAA", "detail": "high" }
                        }]
                    }
                ],
                "max_tokens": 1000
            })
        );
    }
}
