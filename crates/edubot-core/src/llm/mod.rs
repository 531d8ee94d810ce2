//! LLM provider implementations for the generative fallback.
//!
//! - **Groq** (`GroqProvider`): hosted models via the OpenAI-compatible API
//! - **Ollama** (`OllamaProvider`): local models via the Ollama chat API
//! - **ProviderRouter**: primary route with an ordered fallback chain

pub mod groq;
pub mod ollama;
pub mod router;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use edubot_types::config::{LlmConfig, LlmProviderKind, ProviderConfig};
use edubot_types::traits::LlmProvider;

pub use groq::GroqProvider;
pub use ollama::OllamaProvider;
pub use router::{ProviderRouter, Route};

/// Build the provider chain described by `config`.
///
/// Hosted endpoints without an API key are skipped. The `timeout_secs` budget
/// is shared out across the remaining routes. Returns `None` when no endpoint
/// is usable, which callers treat as "generation not configured".
pub fn build_provider(config: &LlmConfig) -> Option<Arc<dyn LlmProvider>> {
    let routes: Vec<Route> = std::iter::once(&config.primary)
        .chain(config.fallbacks.iter())
        .filter_map(build_route)
        .collect();

    match ProviderRouter::from_routes(routes) {
        Ok(router) => {
            let router = router.with_timeout_budget(Duration::from_secs(config.timeout_secs));
            info!(routes = ?router.routes(), "LLM fallback enabled");
            Some(Arc::new(router))
        }
        Err(_) => {
            warn!("no LLM provider configured, generative fallback disabled");
            None
        }
    }
}

fn build_route(config: &ProviderConfig) -> Option<Route> {
    match config.kind {
        LlmProviderKind::Groq => {
            let Some(api_key) = config.api_key.clone().filter(|k| !k.is_empty()) else {
                warn!(model = %config.model, "Groq API key not set, skipping provider");
                return None;
            };
            let provider = match &config.base_url {
                Some(base) => GroqProvider::with_base_url(api_key, base.clone()),
                None => GroqProvider::new(api_key),
            };
            Some(Route::new("groq", config.model.clone(), Arc::new(provider)))
        }
        LlmProviderKind::Ollama => {
            let provider = match &config.base_url {
                Some(base) => OllamaProvider::with_base_url(base.clone()),
                None => OllamaProvider::new(),
            };
            Some(Route::new("ollama", config.model.clone(), Arc::new(provider)))
        }
    }
}
