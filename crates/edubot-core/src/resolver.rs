//! Message resolver: one inbound text in, exactly one reply out.
//!
//! ```text
//! text ─► classify ─┬─ Greeting ──────► format_greeting
//!                   ├─ CourseMatches ─► format_courses
//!                   ├─ FaqMatches ────► format_faqs
//!                   └─ NoMatch ───────► FallbackResponder
//! ```
//!
//! Classification and formatting run against one snapshot taken at the start
//! of the call, so a concurrent refresh never mixes two catalogs in a reply.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info};

use edubot_types::CatalogSnapshot;

use crate::catalog::CatalogStore;
use crate::fallback::FallbackResponder;
use crate::format::{format_courses, format_faqs, format_greeting};
use crate::matcher::{classify, Classification};

/// Reply when classification or formatting fails unexpectedly.
pub const TECHNICAL_ISSUE_REPLY: &str =
    "I apologize for the technical issue. Please try asking about our courses or contact support.";

/// Pure classify-and-format step. `None` means the fallback should answer.
type Renderer = fn(&str, &CatalogSnapshot) -> Option<String>;

/// Resolves inbound messages against the live catalog.
pub struct MessageResolver {
    store: Arc<CatalogStore>,
    fallback: FallbackResponder,
    #[cfg(test)]
    renderer: Renderer,
}

impl std::fmt::Debug for MessageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageResolver")
            .field("store", &self.store)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl MessageResolver {
    pub fn new(store: Arc<CatalogStore>, fallback: FallbackResponder) -> Self {
        Self {
            store,
            fallback,
            #[cfg(test)]
            renderer: render_reply,
        }
    }

    #[cfg(test)]
    fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    #[cfg(not(test))]
    fn renderer(&self) -> Renderer {
        render_reply
    }

    #[cfg(test)]
    fn renderer(&self) -> Renderer {
        self.renderer
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Produce the reply for `text` from `sender`.
    ///
    /// Total: never fails and never returns an empty string.
    pub async fn resolve(&self, text: &str, sender: &str) -> String {
        info!(sender = %sender, "processing message");
        debug!(sender = %sender, text = %text, "message body");

        let snapshot = self.store.snapshot();
        let renderer = self.renderer();

        let reply = match catch_unwind(AssertUnwindSafe(|| renderer(text, &snapshot))) {
            Ok(Some(reply)) => reply,
            Ok(None) => self.fallback.respond(text, &snapshot).await,
            Err(_) => {
                error!(sender = %sender, "message processing panicked");
                return TECHNICAL_ISSUE_REPLY.to_string();
            }
        };

        if reply.trim().is_empty() {
            error!(sender = %sender, "resolved an empty reply");
            return TECHNICAL_ISSUE_REPLY.to_string();
        }
        reply
    }
}

/// Classify `text` and render the matching template.
fn render_reply(text: &str, snapshot: &CatalogSnapshot) -> Option<String> {
    match classify(text, snapshot) {
        Classification::Greeting => {
            debug!("greeting");
            Some(format_greeting(snapshot))
        }
        Classification::CourseMatches(courses) => {
            debug!(courses = courses.len(), "course matches");
            Some(format_courses(&courses, text))
        }
        Classification::FaqMatches(faqs) => {
            debug!(faqs = faqs.len(), "FAQ matches");
            Some(format_faqs(&faqs))
        }
        Classification::NoMatch => {
            debug!("no lexical match, using generative fallback");
            None
        }
    }
}
