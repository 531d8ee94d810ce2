//! Webhook delivery payloads.
//!
//! Only the fields needed to route text messages are modelled; everything
//! else in Meta's envelope is ignored. Status callbacks, media and
//! interactive replies produce no inbound messages.

use serde::Deserialize;

use edubot_types::{ChannelType, InboundMessage};

/// `object` value on WhatsApp Business deliveries.
pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";

/// Top-level webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub metadata: Option<ChangeMetadata>,
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeMetadata {
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

/// One message inside a change.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    /// WhatsApp message id (`wamid....`).
    #[serde(default)]
    pub id: Option<String>,
    /// Sender phone number.
    pub from: String,
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

/// Collect every text message in a delivery, in payload order.
///
/// Deliveries for other objects, changes for fields other than `messages`
/// and non-text messages are skipped.
pub fn extract_text_messages(payload: &WebhookPayload) -> Vec<InboundMessage> {
    if payload.object != WHATSAPP_OBJECT {
        tracing::debug!(object = %payload.object, "ignoring non-WhatsApp webhook object");
        return Vec::new();
    }

    let mut inbound = Vec::new();
    for change in payload
        .entry
        .iter()
        .flat_map(|entry| entry.changes.iter())
        .filter(|change| change.field == "messages")
    {
        let phone_number_id = change
            .value
            .metadata
            .as_ref()
            .and_then(|m| m.phone_number_id.clone());

        for message in &change.value.messages {
            tracing::info!(
                from = %message.from,
                message_type = %message.message_type,
                "webhook message received"
            );
            if message.message_type != "text" {
                continue;
            }
            let body = message
                .text
                .as_ref()
                .map(|t| t.body.clone())
                .unwrap_or_default();

            let mut msg = InboundMessage::new(ChannelType::WhatsApp, message.from.clone(), body);
            msg.metadata = serde_json::json!({
                "wamid": message.id,
                "phone_number_id": phone_number_id,
                "timestamp": message.timestamp,
            });
            inbound.push(msg);
        }
    }
    inbound
}
