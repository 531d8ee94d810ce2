//! Ollama local LLM provider.
//!
//! Implements [`LlmProvider`] for models served by a local Ollama instance
//! through its `/api/chat` endpoint, with streaming disabled.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use edubot_types::errors::BotError;
use edubot_types::traits::LlmProvider;
use edubot_types::{ChatMessage, CompletionRequest, CompletionResponse, TokenUsage};

/// Default Ollama API base URL for local instances.
pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";

/// Ollama LLM provider.
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    /// Base URL for the Ollama API (default: `http://localhost:11434`).
    api_base: String,
}

// -- Ollama API request/response types --

/// Request body for Ollama's `/api/chat` endpoint.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

/// Generation options.
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    /// Upper bound on generated tokens.
    num_predict: u32,
}

/// Non-streaming response from `/api/chat`.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaProvider {
    /// Create a provider connecting to localhost.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_BASE.to_string())
    }

    /// Create a provider with a custom base URL.
    pub fn with_base_url(api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn convert_messages(system: &str, messages: &[ChatMessage]) -> Vec<OllamaMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);

        if !system.is_empty() {
            result.push(OllamaMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }

        for msg in messages {
            result.push(OllamaMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            });
        }

        result
    }

    fn parse_response(resp: OllamaChatResponse) -> CompletionResponse {
        CompletionResponse {
            content: resp.message.content,
            model: resp.model,
            usage: TokenUsage {
                input_tokens: resp.prompt_eval_count.unwrap_or(0),
                output_tokens: resp.eval_count.unwrap_or(0),
            },
        }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BotError> {
        let body = OllamaChatRequest {
            messages: Self::convert_messages(&request.system, &request.messages),
            model: request.model,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        };

        let url = format!("{}/api/chat", self.api_base);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::LlmProvider(format!("Ollama HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::LlmProvider(format!(
                "Ollama API error (HTTP {status}): {body}"
            )));
        }

        let resp_body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| BotError::LlmProvider(format!("Failed to parse Ollama response: {e}")))?;

        Ok(Self::parse_response(resp_body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edubot_types::ChatRole;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            system: "You are helpful.".to_string(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: "Hello!".to_string(),
            }],
            model: "llama3".to_string(),
            max_tokens: 200,
            temperature: Some(0.7),
        }
    }

    #[test]
    fn test_message_conversion() {
        let messages = OllamaProvider::convert_messages(
            "System prompt",
            &[
                ChatMessage {
                    role: ChatRole::User,
                    content: "Hi".to_string(),
                },
                ChatMessage {
                    role: ChatRole::Assistant,
                    content: "Hello".to_string(),
                },
            ],
        );

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "System prompt");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3",
                "stream": false,
                "options": {"num_predict": 200, "temperature": 0.7}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "Hi! How can I help?"},
                "model": "llama3",
                "prompt_eval_count": 12,
                "eval_count": 6
            })))
            .mount(&server)
            .await;

        let provider = OllamaProvider::with_base_url(server.uri());
        let result = provider.complete(sample_request()).await.unwrap();

        assert_eq!(result.content, "Hi! How can I help?");
        assert_eq!(result.model, "llama3");
        assert_eq!(result.usage.input_tokens, 12);
        assert_eq!(result.usage.output_tokens, 6);
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let provider = OllamaProvider::with_base_url(server.uri());
        let err = provider.complete(sample_request()).await.unwrap_err();

        match err {
            BotError::LlmProvider(msg) => {
                assert!(msg.contains("500"), "unexpected message: {msg}");
            }
            other => panic!("Expected LlmProvider error, got: {other:?}"),
        }
    }
}
