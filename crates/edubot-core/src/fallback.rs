//! Generative fallback for messages the matcher cannot classify.
//!
//! The call is bounded by a timeout and never fails: every error path
//! resolves to one of two static replies.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use edubot_types::config::LlmConfig;
use edubot_types::traits::LlmProvider;
use edubot_types::{CatalogSnapshot, ChatMessage, ChatRole, CompletionRequest};

use crate::llm;

/// Reply when no generative service is configured.
pub const NOT_CONFIGURED_REPLY: &str = "I'm here to help with course information! Ask me about our Python, Java, React, or Data Science courses.";

/// Reply when the generative service fails, times out or returns nothing.
pub const APOLOGY_REPLY: &str = "I'm here to help with course information and answer your questions about our educational programs. What would you like to know?";

/// Courses summarised in the system prompt.
pub const PROMPT_COURSE_LIMIT: usize = 5;

/// FAQs summarised in the system prompt.
pub const PROMPT_FAQ_LIMIT: usize = 3;

/// Generation parameters for one fallback call.
#[derive(Debug, Clone)]
pub struct FallbackSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
    /// Opening line of the system prompt.
    pub persona: String,
}

impl From<&LlmConfig> for FallbackSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.primary.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            persona: config.persona.clone(),
        }
    }
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

/// Asks a generative text service to answer free-form questions, grounded
/// in a summary of the current catalog.
pub struct FallbackResponder {
    provider: Option<Arc<dyn LlmProvider>>,
    settings: FallbackSettings,
}

impl std::fmt::Debug for FallbackResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResponder")
            .field("configured", &self.provider.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl FallbackResponder {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, settings: FallbackSettings) -> Self {
        Self { provider, settings }
    }

    /// Build the provider chain and settings from configuration.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(llm::build_provider(config), FallbackSettings::from(config))
    }

    /// A responder with no provider; always returns [`NOT_CONFIGURED_REPLY`].
    pub fn disabled() -> Self {
        Self::new(None, FallbackSettings::default())
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Answer `text`. Never fails and never returns an empty string.
    pub async fn respond(&self, text: &str, snapshot: &CatalogSnapshot) -> String {
        let Some(provider) = &self.provider else {
            warn!("generative fallback not configured");
            return NOT_CONFIGURED_REPLY.to_string();
        };

        let request = CompletionRequest {
            system: build_system_prompt(&self.settings.persona, snapshot),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: text.to_string(),
            }],
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        };

        match tokio::time::timeout(self.settings.timeout, provider.complete(request)).await {
            Ok(Ok(response)) => {
                let content = response.content.trim();
                if content.is_empty() {
                    warn!(model = %response.model, "generative fallback returned empty content");
                    return APOLOGY_REPLY.to_string();
                }
                info!(
                    model = %response.model,
                    output_tokens = response.usage.output_tokens,
                    "generative reply produced"
                );
                debug!(preview = %preview(text), "fallback answered");
                content.to_string()
            }
            Ok(Err(e)) => {
                error!(error = %e, "generative fallback failed");
                APOLOGY_REPLY.to_string()
            }
            Err(_) => {
                error!(
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    "generative fallback timed out"
                );
                APOLOGY_REPLY.to_string()
            }
        }
    }
}

/// Compose the system prompt: persona, course summaries, FAQ summaries and
/// the response guidelines.
pub fn build_system_prompt(persona: &str, snapshot: &CatalogSnapshot) -> String {
    let course_info = snapshot
        .courses
        .iter()
        .take(PROMPT_COURSE_LIMIT)
        .map(|c| {
            format!(
                "- {}: {} (${}, {} weeks, Instructor: {})",
                c.title, c.description, c.price, c.duration_weeks, c.instructor
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let faq_info = snapshot
        .faqs
        .iter()
        .take(PROMPT_FAQ_LIMIT)
        .map(|f| format!("Q: {}\nA: {}", f.question, f.answer))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{persona}\n\n\
         Available Courses:\n\
         {course_info}\n\n\
         Common FAQs:\n\
         {faq_info}\n\n\
         Keep responses concise (under 200 words), helpful, and focused on education. \
         Always encourage learning and reference our actual courses when relevant."
    )
}

/// First 50 characters of a message, for logs.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
