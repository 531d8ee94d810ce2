//! WhatsApp Business Cloud API channel.
//!
//! - Outbound text messages via the Graph API (`channel`)
//! - Webhook payload types and text-message extraction (`webhook`)
//! - Subscription and `X-Hub-Signature-256` verification (`channel`)

pub mod channel;
pub mod webhook;

pub use channel::WhatsAppChannel;
pub use webhook::{extract_text_messages, WebhookPayload};
