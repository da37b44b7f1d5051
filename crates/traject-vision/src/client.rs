//! OpenAI-compatible vision chat client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::VisionError;
use crate::traits::{ChatModel, ChatRequest};

/// Connection settings for the chat endpoint.
#[derive(Clone, Debug)]
pub struct ChatClientConfig {
    /// API base, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
}

/// Vision chat client speaking the `/chat/completions` wire format.
#[derive(Clone, Debug)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    config: ChatClientConfig,
}

impl OpenAiChatClient {
    /// Create a client with its own connection pool.
    #[must_use]
    pub fn new(config: ChatClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text {
        text: String,
    },
    ImageUrl {
        image_url: ImageUrl,
    },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn build_content(request: &ChatRequest) -> Vec<ContentPart> {
    let mut content = vec![ContentPart::Text {
        text: request.prompt.clone(),
    }];
    content.extend(request.images.iter().map(|frame| ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: format!("data:image/jpeg;base64,{frame}"),
        },
    }));
    content
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, VisionError> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages: vec![WireMessage {
                role: "user",
                content: build_content(&request),
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            model = %self.config.model,
            images = request.images.len(),
            "sending chat completion"
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(VisionError::MissingContent)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiChatClient {
        OpenAiChatClient::new(ChatClientConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            model: "gpt-4o".into(),
        })
    }

    #[tokio::test]
    async fn completes_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "a caption"}}]
            })))
            .mount(&server)
            .await;

        let out = client_for(&server)
            .complete(ChatRequest::new("describe", vec!["QUJD".into()], 500))
            .await
            .unwrap();
        assert_eq!(out, "a caption");
    }

    #[tokio::test]
    async fn images_become_data_uri_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "p"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,QUJD"}}
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let out = client_for(&server)
            .complete(ChatRequest::new("p", vec!["QUJD".into()], 100))
            .await
            .unwrap();
        assert_eq!(out, "ok");
    }

    #[tokio::test]
    async fn api_failure_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(ChatRequest::new("p", vec![], 100))
            .await
            .unwrap_err();
        match err {
            VisionError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_missing_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(ChatRequest::new("p", vec![], 100))
            .await
            .unwrap_err();
        assert!(matches!(err, VisionError::MissingContent));
    }

    #[tokio::test]
    async fn temperature_is_forwarded_when_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"temperature": 0.7})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let out = client_for(&server)
            .complete(ChatRequest::new("p", vec![], 100).with_temperature(0.7))
            .await
            .unwrap();
        assert_eq!(out, "ok");
    }
}
