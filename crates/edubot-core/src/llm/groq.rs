//! Groq chat completions provider.
//!
//! Implements [`LlmProvider`] against Groq's OpenAI-compatible
//! `/openai/v1/chat/completions` endpoint. The system prompt travels as the
//! first `system` message.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use edubot_types::errors::BotError;
use edubot_types::traits::LlmProvider;
use edubot_types::{ChatMessage, CompletionRequest, CompletionResponse, TokenUsage};

/// Default Groq API base URL.
pub const DEFAULT_GROQ_BASE: &str = "https://api.groq.com";

/// Default chat model.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

/// Groq LLM provider.
pub struct GroqProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Groq API key.
    api_key: String,
    /// Base URL for the API (overridable for testing).
    api_base: String,
}

impl std::fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

// -- Chat completions request/response types --

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

impl GroqProvider {
    /// Create a provider for the public Groq API.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_GROQ_BASE.to_string())
    }

    /// Create a provider with a custom base URL.
    pub fn with_base_url(api_key: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Prepend the system prompt and map roles to their wire names.
    fn convert_messages(system: &str, messages: &[ChatMessage]) -> Vec<ApiMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            result.push(ApiMessage {
                role: "system".to_string(),
                content: Some(system.to_string()),
            });
        }
        result.extend(messages.iter().map(|m| ApiMessage {
            role: m.role.as_str().to_string(),
            content: Some(m.content.clone()),
        }));
        result
    }

    /// Take the first choice. A response without choices yields empty content.
    fn parse_response(resp: ChatCompletionResponse) -> CompletionResponse {
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        CompletionResponse {
            content,
            model: resp.model,
            usage: resp
                .usage
                .map(|u| TokenUsage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
        }
    }

    async fn send_request(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<CompletionResponse, BotError> {
        let url = format!("{}/openai/v1/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::LlmProvider(format!("Groq HTTP request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::RateLimitExceeded(
                "Groq API rate limit exceeded (429)".to_string(),
            ));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BotError::LlmProvider(
                "Groq API authentication failed: invalid API key".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err_resp) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(BotError::LlmProvider(format!(
                    "Groq API error ({}): {}",
                    err_resp.error.error_type.as_deref().unwrap_or("unknown"),
                    err_resp.error.message
                )));
            }
            return Err(BotError::LlmProvider(format!(
                "Groq API error (HTTP {status}): {body}"
            )));
        }

        let resp_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BotError::LlmProvider(format!("Failed to parse Groq response: {e}")))?;

        Ok(Self::parse_response(resp_body))
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BotError> {
        let api_request = ChatCompletionRequest {
            messages: Self::convert_messages(&request.system, &request.messages),
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        self.send_request(api_request).await
    }
}
