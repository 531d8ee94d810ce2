/// Message types shared by the channels, the resolver and the LLM providers.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================
// Channel Types
// ============================================================

/// A message received from a communication channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Unique message identifier.
    pub id: Uuid,
    /// The message text content.
    pub text: String,
    /// Which channel this came from.
    pub channel: ChannelType,
    /// Sender identifier (a phone number for WhatsApp).
    pub sender: String,
    /// When the message was received.
    pub timestamp: DateTime<Utc>,
    /// Additional channel-specific metadata.
    pub metadata: serde_json::Value,
}

impl InboundMessage {
    /// Build an inbound message stamped with a fresh id and the current time.
    pub fn new(channel: ChannelType, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            channel,
            sender: sender.into(),
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// A message to send through a communication channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Recipient identifier.
    pub recipient: String,
    /// The message text content.
    pub text: String,
    /// Which channel to send through.
    pub channel: ChannelType,
    /// Additional channel-specific metadata.
    pub metadata: serde_json::Value,
}

impl OutboundMessage {
    /// Reply to the sender of `inbound` on the same channel.
    pub fn reply_to(inbound: &InboundMessage, text: impl Into<String>) -> Self {
        Self {
            recipient: inbound.sender.clone(),
            text: text.into(),
            channel: inbound.channel,
            metadata: serde_json::Value::Null,
        }
    }
}

/// Supported communication channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    /// WhatsApp Business Cloud API.
    WhatsApp,
    /// The HTTP test endpoint; replies are returned, never delivered.
    Test,
}

// ============================================================
// LLM Types
// ============================================================

/// A request to an LLM for completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt.
    pub system: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Model identifier (e.g., "llama-3.1-8b-instant").
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature for sampling.
    pub temperature: Option<f64>,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author.
    pub role: ChatRole,
    /// Content of the message.
    pub content: String,
}

/// Roles in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    /// The user sending the message.
    User,
    /// The AI assistant.
    Assistant,
}

impl ChatRole {
    /// Wire name used by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Response from an LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text content.
    pub content: String,
    /// Model identifier that generated this response.
    pub model: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
}

/// Token usage statistics from an LLM call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the input prompt.
    pub input_tokens: u32,
    /// Tokens in the generated output.
    pub output_tokens: u32,
}
