/// Unified error type for EduBot.
///
/// All crates use this error type for propagation across crate boundaries.
/// Foreign errors are converted into the matching variant at the call site.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Error from a catalog source (file parsing, empty or inconsistent data).
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Database error (connection, query, migration, seeding).
    #[error("database error: {0}")]
    Database(String),

    /// Error from an LLM provider (API call failures, deserialization).
    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    /// Error from a channel adapter (WhatsApp send failures, payload parsing).
    #[error("channel error: {0}")]
    Channel(String),

    /// Webhook signature did not verify.
    #[error("signature error: {0}")]
    Signature(String),

    /// Error from configuration loading or validation.
    #[error("config error: {0}")]
    Config(String),

    /// Rate limit exceeded on an upstream API.
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Timeout waiting for an upstream response.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for BotError {
    fn from(err: serde_yaml::Error) -> Self {
        BotError::Serialization(err.to_string())
    }
}
