//! Provider router with fallback chain.
//!
//! Each route pairs a provider with the model it should be asked for. The
//! router tries routes in order until one succeeds or all have been
//! exhausted. With a timeout budget set, each route gets an equal share so a
//! hung primary still leaves time for the fallbacks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use edubot_types::errors::BotError;
use edubot_types::traits::LlmProvider;
use edubot_types::{CompletionRequest, CompletionResponse};

/// One provider plus the model name sent to it.
#[derive(Clone)]
pub struct Route {
    /// Short label used in logs (e.g., "groq").
    pub label: String,
    /// Model identifier that replaces the request's model on this route.
    pub model: String,
    pub provider: Arc<dyn LlmProvider>,
}

impl Route {
    pub fn new(
        label: impl Into<String>,
        model: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            label: label.into(),
            model: model.into(),
            provider,
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("label", &self.label)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Routes LLM requests to a primary provider with automatic fallback.
pub struct ProviderRouter {
    /// Ordered routes: primary first, then fallbacks.
    routes: Vec<Route>,
    /// Upper bound on a single route's call.
    route_timeout: Option<Duration>,
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("routes", &self.routes)
            .field("route_timeout", &self.route_timeout)
            .finish()
    }
}

impl ProviderRouter {
    /// Create a router with a primary route and a fallback chain.
    pub fn new(primary: Route, fallbacks: Vec<Route>) -> Self {
        let mut routes = Vec::with_capacity(1 + fallbacks.len());
        routes.push(primary);
        routes.extend(fallbacks);
        Self {
            routes,
            route_timeout: None,
        }
    }

    /// Create a router from an ordered list of routes.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty.
    pub fn from_routes(routes: Vec<Route>) -> Result<Self, BotError> {
        if routes.is_empty() {
            return Err(BotError::Config(
                "ProviderRouter requires at least one provider".to_string(),
            ));
        }
        Ok(Self {
            routes,
            route_timeout: None,
        })
    }

    /// Split `total` evenly across the routes and bound each call by its share.
    pub fn with_timeout_budget(mut self, total: Duration) -> Self {
        let share = total / self.routes.len().max(1) as u32;
        self.route_timeout = Some(share);
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route_timeout(&self) -> Option<Duration> {
        self.route_timeout
    }

    async fn call_route(
        &self,
        route: &Route,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BotError> {
        let Some(limit) = self.route_timeout else {
            return route.provider.complete(request).await;
        };
        match tokio::time::timeout(limit, route.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(BotError::Timeout(format!(
                "{} provider did not answer within {}ms",
                route.label,
                limit.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl LlmProvider for ProviderRouter {
    /// Send a completion request, falling back through routes on failure.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BotError> {
        let mut last_error = None;

        for (i, route) in self.routes.iter().enumerate() {
            let mut routed = request.clone();
            routed.model = route.model.clone();

            match self.call_route(route, routed).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        provider_index = i,
                        provider = %route.label,
                        error = %e,
                        "LLM provider failed, trying next in fallback chain"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BotError::LlmProvider("No providers available".to_string())))
    }
}
