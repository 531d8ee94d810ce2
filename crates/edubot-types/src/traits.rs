/// Trait contracts for EduBot's external collaborators.
///
/// The resolver pipeline codes against these interfaces, never against the
/// concrete database, HTTP client or messaging platform. Tests substitute
/// in-memory implementations.
use async_trait::async_trait;

use crate::catalog::CatalogSnapshot;
use crate::errors::BotError;
use crate::messages::{CompletionRequest, CompletionResponse, OutboundMessage};

// ============================================================
// Catalog Trait
// ============================================================

/// A backing datastore that can produce a full catalog snapshot.
///
/// Implementations load courses and FAQs in bulk. A snapshot is returned only
/// when both collections loaded; partial results are reported as errors so the
/// store can keep serving the previous snapshot.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load every active course and FAQ.
    async fn load(&self) -> Result<CatalogSnapshot, BotError>;

    /// Report whether the backing store is reachable.
    ///
    /// Used by health checks only. Sources without a connection report `true`.
    async fn ping(&self) -> bool {
        true
    }
}

// ============================================================
// LLM Provider Trait
// ============================================================

/// Provider-agnostic LLM interface.
///
/// Supports multiple generative text services (Groq, Ollama, ...) behind one
/// completion call.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a completion request. Returns the model's response.
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, BotError>;
}

// ============================================================
// Channel Trait
// ============================================================

/// Adapter for an outbound messaging channel.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Send a message through this channel.
    async fn send_message(&self, message: OutboundMessage) -> Result<(), BotError>;
}
